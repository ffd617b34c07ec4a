//! Post-frame frontend sync.
//!
//! Change records cross into user-visible state only here. [`PropertyStore`]
//! is a ready-made frontend that keeps the latest value of every animated
//! property with its provenance, and each animator's playback status.

use hashbrown::HashMap;
use kinetic_animation::{AnimationRecord, NodeId, PropertyValue};
use serde::{Deserialize, Serialize};

use crate::scheduler::FrameOutput;

/// Receiver of a frame's change records.
pub trait FrontendSync {
    fn sync_record(&mut self, frame: u64, record: &AnimationRecord);

    /// Apply every record of `output` in order.
    fn sync_frame(&mut self, output: &FrameOutput) {
        for record in &output.records {
            self.sync_record(output.frame, record);
        }
    }
}

/// Latest value of one property, with who wrote it and when.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyEntry {
    pub value: PropertyValue,
    pub frame: u64,
    pub animator: NodeId,
}

/// Two animators wrote the same property in the same frame; the later one won.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyConflict {
    pub target: NodeId,
    pub property: String,
    pub frame: u64,
    pub previous_animator: NodeId,
    pub previous_value: PropertyValue,
    pub new_animator: NodeId,
    pub new_value: PropertyValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimatorStatus {
    pub running: bool,
    pub normalized_time: f32,
    pub current_loop: i32,
    pub frame: u64,
}

#[derive(Debug, Default)]
pub struct PropertyStore {
    properties: HashMap<(NodeId, String), PropertyEntry>,
    animators: HashMap<NodeId, AnimatorStatus>,
    conflicts: Vec<PropertyConflict>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: NodeId, property: &str) -> Option<&PropertyEntry> {
        self.properties.get(&(target, property.to_string()))
    }

    pub fn value(&self, target: NodeId, property: &str) -> Option<&PropertyValue> {
        self.get(target, property).map(|e| &e.value)
    }

    pub fn status(&self, animator: NodeId) -> Option<&AnimatorStatus> {
        self.animators.get(&animator)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(NodeId, String), &PropertyEntry)> {
        self.properties.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Conflicts recorded since the last call.
    pub fn take_conflicts(&mut self) -> Vec<PropertyConflict> {
        std::mem::take(&mut self.conflicts)
    }
}

impl FrontendSync for PropertyStore {
    fn sync_record(&mut self, frame: u64, record: &AnimationRecord) {
        self.animators.insert(
            record.animator,
            AnimatorStatus {
                running: record.running,
                normalized_time: record.normalized_time,
                current_loop: record.current_loop,
                frame,
            },
        );

        for change in &record.changes {
            let key = (change.target, change.property.clone());
            if let Some(prev) = self.properties.get(&key) {
                if prev.frame == frame && prev.animator != record.animator {
                    log::warn!(
                        "property {}.{} written by animators {} and {} in frame {frame}",
                        change.target,
                        change.property,
                        prev.animator,
                        record.animator
                    );
                    self.conflicts.push(PropertyConflict {
                        target: change.target,
                        property: change.property.clone(),
                        frame,
                        previous_animator: prev.animator,
                        previous_value: prev.value.clone(),
                        new_animator: record.animator,
                        new_value: change.value.clone(),
                    });
                }
            }
            // last-writer-wins
            self.properties.insert(
                key,
                PropertyEntry {
                    value: change.value.clone(),
                    frame,
                    animator: record.animator,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinetic_animation::TargetChange;

    fn record(animator: u64, value: f32) -> AnimationRecord {
        AnimationRecord {
            animator: NodeId(animator),
            normalized_time: 0.5,
            local_time: 0.5,
            current_loop: 0,
            final_frame: false,
            running: true,
            changes: vec![TargetChange {
                target: NodeId(7),
                property: "x".into(),
                value: PropertyValue::Float(value),
            }],
        }
    }

    #[test]
    fn same_frame_writers_conflict() {
        let mut store = PropertyStore::new();
        store.sync_record(1, &record(1, 0.25));
        store.sync_record(1, &record(2, 0.75));
        assert_eq!(store.value(NodeId(7), "x"), Some(&PropertyValue::Float(0.75)));
        let conflicts = store.take_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].previous_animator, NodeId(1));
        assert_eq!(conflicts[0].new_animator, NodeId(2));
    }

    #[test]
    fn later_frames_overwrite_silently() {
        let mut store = PropertyStore::new();
        store.sync_record(1, &record(1, 0.25));
        store.sync_record(2, &record(2, 0.75));
        assert!(store.take_conflicts().is_empty());
        let entry = store.get(NodeId(7), "x").unwrap();
        assert_eq!(entry.frame, 2);
        assert_eq!(store.status(NodeId(2)).map(|s| s.running), Some(true));
    }
}

//! The shared video preview pool, as a browser-free model.
//!
//! Pooled playback elements are keyed by media URL and owned by at most one
//! result container at a time. The model tracks the single active
//! [`PreviewBinding`], scrub state, and generation-guarded seeks; every
//! browser effect is returned as a [`PoolCommand`] list that the driver
//! executes in order, within the same handler invocation. That keeps the
//! ownership hand-off atomic with respect to the event loop.

use std::collections::HashMap;

use crate::api::ResultItem;

/// Driver-assigned identifier for a rendered result container.
pub type ContainerId = usize;

/// Clip boundaries in seconds, derived from frame metadata at render time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipTiming {
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Where the hovered preview starts: the keyframe's own position.
    pub keyframe_start: f64,
}

impl ClipTiming {
    /// Requires clip frame metadata and a positive fps; items without them
    /// get no preview.
    pub fn from_item(item: &ResultItem) -> Option<Self> {
        let fps = item.fps.filter(|fps| *fps > 0.0)?;
        let clip_start = item.clip_start_frame? as f64;
        let clip_end = item.clip_end_frame? as f64;
        let relative = item.frame.unwrap_or(0) as f64;
        Some(Self {
            start_seconds: clip_start / fps,
            end_seconds: clip_end / fps,
            keyframe_start: (clip_start + relative) / fps,
        })
    }

    pub fn duration(&self) -> f64 {
        (self.end_seconds - self.start_seconds).max(0.0)
    }

    /// Map a pointer position within the hit area onto the clip, clamped
    /// at both ends.
    pub fn scrub_time(&self, pointer_x: f64, area_left: f64, area_width: f64) -> f64 {
        if area_width <= 0.0 {
            return self.start_seconds;
        }
        let fraction = ((pointer_x - area_left) / area_width).clamp(0.0, 1.0);
        self.start_seconds + fraction * self.duration()
    }

    /// Progress-bar fill percentage at `current`.
    pub fn progress_percent(&self, current: f64) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        ((current - self.start_seconds) / duration).clamp(0.0, 1.0) * 100.0
    }

    /// Remaining-time label at `current`, `m:ss` with zero-padded seconds.
    pub fn remaining_label(&self, current: f64) -> String {
        format_time((self.end_seconds - current).max(0.0))
    }
}

pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Immutable per-container clip state captured once at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerClip {
    pub media_url: String,
    pub timing: ClipTiming,
}

/// The (pooled element, container) pair currently receiving hover input.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewBinding {
    pub container: ContainerId,
    pub media_url: String,
}

/// Browser effects, executed by the driver in order.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolCommand {
    /// Pause the element for `media_url`, rewind it to `rewind_to`, and
    /// return it to the off-screen pool container. Self-contained so a
    /// hand-off can release the old owner while `Pause`/`Play`/`Seek`
    /// keep targeting the active binding's element.
    Release {
        container: ContainerId,
        media_url: String,
        rewind_to: f64,
    },
    /// Move the pooled element for `media_url` into `container`.
    Attach {
        container: ContainerId,
        media_url: String,
    },
    HideThumbnail {
        container: ContainerId,
    },
    ShowThumbnail {
        container: ContainerId,
    },
    Pause,
    Play,
    /// Seek the active element. Completion must be reported back through
    /// [`PreviewPool::seek_completed`] with the same generation.
    Seek {
        time: f64,
        generation: u64,
    },
    RenderProgress {
        container: ContainerId,
        percent: f64,
        remaining: String,
    },
    /// Arm the settle timer before a looped preview may resume.
    ScheduleLoopResume {
        container: ContainerId,
    },
}

#[derive(Debug, Default)]
pub struct PreviewPool {
    containers: HashMap<ContainerId, ContainerClip>,
    active: Option<PreviewBinding>,
    scrubbing: bool,
    /// Bumped whenever pending seek completions become stale.
    generation: u64,
    /// Generation whose completed seek should start playback.
    pending_play: Option<u64>,
}

impl PreviewPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rendered container. Idempotent: a container initialized
    /// once keeps its first clip state. Returns `false` when the item has
    /// no usable media metadata.
    pub fn bind(&mut self, container: ContainerId, item: &ResultItem) -> bool {
        if self.containers.contains_key(&container) {
            return true;
        }
        let media_url = match &item.media_url {
            Some(url) => url.clone(),
            None => return false,
        };
        let timing = match ClipTiming::from_item(item) {
            Some(timing) => timing,
            None => return false,
        };
        self.containers
            .insert(container, ContainerClip { media_url, timing });
        true
    }

    pub fn active(&self) -> Option<&PreviewBinding> {
        self.active.as_ref()
    }

    pub fn clip(&self, container: ContainerId) -> Option<&ContainerClip> {
        self.containers.get(&container)
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    /// Pointer entered a container. Releases the previous owner (if any),
    /// attaches the pooled element, and seeks to the keyframe start;
    /// playback begins only once that seek completes.
    pub fn hover_enter(&mut self, container: ContainerId) -> Vec<PoolCommand> {
        let clip = match self.containers.get(&container) {
            Some(clip) => clip.clone(),
            None => return Vec::new(),
        };
        if self
            .active
            .as_ref()
            .is_some_and(|binding| binding.container == container)
        {
            return Vec::new();
        }

        let mut commands = Vec::new();
        if let Some(prev) = self.active.take() {
            let rewind_to = self
                .containers
                .get(&prev.container)
                .map(|c| c.timing.keyframe_start)
                .unwrap_or(0.0);
            commands.push(PoolCommand::Release {
                container: prev.container,
                media_url: prev.media_url,
                rewind_to,
            });
            commands.push(PoolCommand::ShowThumbnail {
                container: prev.container,
            });
        }

        self.generation += 1;
        self.pending_play = Some(self.generation);
        self.scrubbing = false;
        self.active = Some(PreviewBinding {
            container,
            media_url: clip.media_url.clone(),
        });

        commands.push(PoolCommand::Attach {
            container,
            media_url: clip.media_url,
        });
        commands.push(PoolCommand::HideThumbnail { container });
        commands.push(PoolCommand::Seek {
            time: clip.timing.keyframe_start,
            generation: self.generation,
        });
        commands
    }

    /// Completion callback for an issued seek. Playback starts only when
    /// the generation still matches the pending seek of the active
    /// binding; stale completions (hover moved on meanwhile) are dropped.
    pub fn seek_completed(&mut self, generation: u64) -> Vec<PoolCommand> {
        if self.active.is_none() || self.scrubbing {
            return Vec::new();
        }
        match self.pending_play {
            Some(pending) if pending == generation => {
                self.pending_play = None;
                vec![PoolCommand::Play]
            }
            _ => {
                tracing::debug!(generation, "dropping stale seek completion");
                Vec::new()
            }
        }
    }

    /// Pointer left the owning container: pause, rewind to the keyframe
    /// start, detach back to the pool, restore the thumbnail.
    pub fn hover_leave(&mut self, container: ContainerId) -> Vec<PoolCommand> {
        let binding = match &self.active {
            Some(binding) if binding.container == container => self.active.take(),
            _ => return Vec::new(),
        };
        let Some(binding) = binding else {
            return Vec::new();
        };

        self.generation += 1;
        self.pending_play = None;
        self.scrubbing = false;

        let rewind_to = self
            .containers
            .get(&container)
            .map(|c| c.timing.keyframe_start)
            .unwrap_or(0.0);
        vec![
            PoolCommand::Release {
                container,
                media_url: binding.media_url,
                rewind_to,
            },
            PoolCommand::ShowThumbnail { container },
        ]
    }

    /// Playback position moved. Renders progress and applies the loop
    /// rule: reaching the clip end pauses, rewinds to the clip start, and
    /// arms the settle timer; the resume decision happens when the timer
    /// fires.
    pub fn time_update(&mut self, container: ContainerId, current: f64) -> Vec<PoolCommand> {
        if !self.owns(container) || self.scrubbing {
            return Vec::new();
        }
        let Some(clip) = self.containers.get(&container) else {
            return Vec::new();
        };
        let timing = clip.timing;

        let mut commands = vec![PoolCommand::RenderProgress {
            container,
            percent: timing.progress_percent(current),
            remaining: timing.remaining_label(current),
        }];

        if timing.duration() > 0.0 && current >= timing.end_seconds {
            self.generation += 1;
            self.pending_play = None;
            commands.push(PoolCommand::Pause);
            commands.push(PoolCommand::Seek {
                time: timing.start_seconds,
                generation: self.generation,
            });
            commands.push(PoolCommand::ScheduleLoopResume { container });
        }
        commands
    }

    /// Settle timer fired. Resume only if the binding is unchanged, the
    /// pointer is still over the container, and no scrub has started.
    pub fn loop_resume_elapsed(
        &mut self,
        container: ContainerId,
        pointer_over: bool,
    ) -> Vec<PoolCommand> {
        if self.owns(container) && pointer_over && !self.scrubbing {
            vec![PoolCommand::Play]
        } else {
            Vec::new()
        }
    }

    /// Pointer-down on the progress hit area. Only the container that owns
    /// the active element may be scrubbed.
    pub fn scrub_begin(
        &mut self,
        container: ContainerId,
        pointer_x: f64,
        area_left: f64,
        area_width: f64,
    ) -> Vec<PoolCommand> {
        if !self.owns(container) {
            return Vec::new();
        }
        self.scrubbing = true;
        // Invalidate any play-after-seek still pending from hover entry.
        self.generation += 1;
        self.pending_play = None;

        let mut commands = vec![PoolCommand::Pause];
        commands.extend(self.scrub_to(container, pointer_x, area_left, area_width));
        commands
    }

    pub fn scrub_move(
        &mut self,
        container: ContainerId,
        pointer_x: f64,
        area_left: f64,
        area_width: f64,
    ) -> Vec<PoolCommand> {
        if !self.scrubbing || !self.owns(container) {
            return Vec::new();
        }
        self.scrub_to(container, pointer_x, area_left, area_width)
    }

    /// Pointer-up ends the drag and resumes playback at the new position.
    pub fn scrub_end(
        &mut self,
        container: ContainerId,
        pointer_x: f64,
        area_left: f64,
        area_width: f64,
    ) -> Vec<PoolCommand> {
        if !self.scrubbing || !self.owns(container) {
            return Vec::new();
        }
        self.scrubbing = false;
        let mut commands = self.scrub_to(container, pointer_x, area_left, area_width);
        commands.push(PoolCommand::Play);
        commands
    }

    fn owns(&self, container: ContainerId) -> bool {
        self.active
            .as_ref()
            .is_some_and(|binding| binding.container == container)
    }

    /// Position and progress bar move together, synchronously.
    fn scrub_to(
        &mut self,
        container: ContainerId,
        pointer_x: f64,
        area_left: f64,
        area_width: f64,
    ) -> Vec<PoolCommand> {
        let Some(clip) = self.containers.get(&container) else {
            return Vec::new();
        };
        let time = clip.timing.scrub_time(pointer_x, area_left, area_width);
        self.generation += 1;
        vec![
            PoolCommand::Seek {
                time,
                generation: self.generation,
            },
            PoolCommand::RenderProgress {
                container,
                percent: clip.timing.progress_percent(time),
                remaining: clip.timing.remaining_label(time),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_item(id: u64, media: &str) -> ResultItem {
        ResultItem {
            keyframe_id: id,
            thumbnail: format!("/t/{id}.jpg"),
            media_url: Some(media.to_owned()),
            frame: Some(0),
            clip_start_frame: Some(30),
            clip_end_frame: Some(90),
            fps: Some(30.0),
        }
    }

    fn pool_with_two_containers() -> PreviewPool {
        let mut pool = PreviewPool::new();
        assert!(pool.bind(0, &clip_item(1, "/m/a.mp4")));
        assert!(pool.bind(1, &clip_item(2, "/m/a.mp4")));
        pool
    }

    #[test]
    fn timing_from_frame_metadata() {
        let mut item = clip_item(1, "/m/a.mp4");
        item.frame = Some(15);
        let timing = ClipTiming::from_item(&item).unwrap();
        assert_eq!(timing.start_seconds, 1.0);
        assert_eq!(timing.end_seconds, 3.0);
        assert_eq!(timing.keyframe_start, 1.5);
    }

    #[test]
    fn items_without_metadata_are_not_bound() {
        let mut pool = PreviewPool::new();
        let mut item = clip_item(1, "/m/a.mp4");
        item.media_url = None;
        assert!(!pool.bind(0, &item));

        let mut item = clip_item(1, "/m/a.mp4");
        item.fps = Some(0.0);
        assert!(!pool.bind(0, &item));
    }

    #[test]
    fn bind_is_idempotent() {
        let mut pool = PreviewPool::new();
        pool.bind(0, &clip_item(1, "/m/a.mp4"));
        pool.bind(0, &clip_item(2, "/m/b.mp4"));
        assert_eq!(pool.clip(0).unwrap().media_url, "/m/a.mp4");
    }

    #[test]
    fn scrub_maps_pointer_linearly_and_clamped() {
        let timing = ClipTiming::from_item(&clip_item(1, "/m/a.mp4")).unwrap();
        // 50% of the hit area: 1.0 + 0.5 * (3.0 - 1.0) = 2.0s.
        let time = timing.scrub_time(150.0, 100.0, 100.0);
        assert_eq!(time, 2.0);
        assert_eq!(timing.remaining_label(time), "0:01");
        assert_eq!(timing.progress_percent(time), 50.0);

        assert_eq!(timing.scrub_time(90.0, 100.0, 100.0), 1.0);
        assert_eq!(timing.scrub_time(500.0, 100.0, 100.0), 3.0);
    }

    #[test]
    fn progress_is_clamped() {
        let timing = ClipTiming::from_item(&clip_item(1, "/m/a.mp4")).unwrap();
        assert_eq!(timing.progress_percent(0.0), 0.0);
        assert_eq!(timing.progress_percent(99.0), 100.0);
    }

    #[test]
    fn time_labels_are_zero_padded() {
        assert_eq!(format_time(0.4), "0:00");
        assert_eq!(format_time(61.9), "1:01");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn hover_enter_attaches_and_plays_after_seek() {
        let mut pool = pool_with_two_containers();
        let commands = pool.hover_enter(0);

        let generation = match commands.as_slice() {
            [PoolCommand::Attach { container: 0, .. }, PoolCommand::HideThumbnail { container: 0 }, PoolCommand::Seek { time, generation }] =>
            {
                assert_eq!(*time, 1.0);
                *generation
            }
            other => panic!("unexpected commands: {other:?}"),
        };

        // Never play at a stale position: only the seek completion starts
        // playback, exactly once.
        assert_eq!(pool.seek_completed(generation), vec![PoolCommand::Play]);
        assert!(pool.seek_completed(generation).is_empty());
    }

    #[test]
    fn handoff_moves_shared_element_between_containers() {
        let mut pool = pool_with_two_containers();
        pool.hover_enter(0);

        let commands = pool.hover_enter(1);
        assert!(matches!(
            commands[0],
            PoolCommand::Release { container: 0, .. }
        ));
        assert_eq!(commands[1], PoolCommand::ShowThumbnail { container: 0 });
        assert!(matches!(
            commands[2],
            PoolCommand::Attach { container: 1, .. }
        ));
        assert_eq!(commands[3], PoolCommand::HideThumbnail { container: 1 });
        assert!(matches!(commands[4], PoolCommand::Seek { .. }));

        let binding = pool.active().unwrap();
        assert_eq!(binding.container, 1);
        assert_eq!(binding.media_url, "/m/a.mp4");
    }

    #[test]
    fn stale_seek_completion_is_dropped() {
        let mut pool = pool_with_two_containers();
        let commands = pool.hover_enter(0);
        let PoolCommand::Seek { generation, .. } = commands[2] else {
            panic!("expected seek");
        };

        pool.hover_leave(0);
        assert!(pool.seek_completed(generation).is_empty());

        // Same race across a hand-off: the old generation must not start
        // playback on the new container.
        let commands = pool.hover_enter(0);
        let PoolCommand::Seek {
            generation: first, ..
        } = commands[2]
        else {
            panic!("expected seek");
        };
        pool.hover_enter(1);
        assert!(pool.seek_completed(first).is_empty());
    }

    #[test]
    fn hover_leave_releases_and_restores_thumbnail() {
        let mut pool = pool_with_two_containers();
        pool.hover_enter(0);

        let commands = pool.hover_leave(0);
        assert_eq!(
            commands,
            vec![
                PoolCommand::Release {
                    container: 0,
                    media_url: "/m/a.mp4".into(),
                    rewind_to: 1.0,
                },
                PoolCommand::ShowThumbnail { container: 0 },
            ]
        );
        assert!(pool.active().is_none());

        // Leaving a container that is not the owner is a no-op.
        assert!(pool.hover_leave(1).is_empty());
    }

    #[test]
    fn loop_rule_pauses_rewinds_and_arms_settle_timer() {
        let mut pool = pool_with_two_containers();
        pool.hover_enter(0);

        let commands = pool.time_update(0, 3.0);
        assert!(matches!(commands[0], PoolCommand::RenderProgress { .. }));
        assert_eq!(commands[1], PoolCommand::Pause);
        assert!(matches!(commands[2], PoolCommand::Seek { time, .. } if time == 1.0));
        assert_eq!(commands[3], PoolCommand::ScheduleLoopResume { container: 0 });

        // Resume only while the pointer is still over the container.
        assert!(pool.loop_resume_elapsed(0, false).is_empty());
        assert_eq!(pool.loop_resume_elapsed(0, true), vec![PoolCommand::Play]);
    }

    #[test]
    fn loop_resume_is_dropped_after_handoff() {
        let mut pool = pool_with_two_containers();
        pool.hover_enter(0);
        pool.time_update(0, 3.0);
        pool.hover_enter(1);
        assert!(pool.loop_resume_elapsed(0, true).is_empty());
    }

    #[test]
    fn mid_clip_time_update_renders_progress_only() {
        let mut pool = pool_with_two_containers();
        pool.hover_enter(0);

        let commands = pool.time_update(0, 2.0);
        assert_eq!(
            commands,
            vec![PoolCommand::RenderProgress {
                container: 0,
                percent: 50.0,
                remaining: "0:01".into(),
            }]
        );
    }

    #[test]
    fn only_the_owner_may_scrub() {
        let mut pool = pool_with_two_containers();
        pool.hover_enter(0);
        assert!(pool.scrub_begin(1, 150.0, 100.0, 100.0).is_empty());
        assert!(!pool.scrub_begin(0, 150.0, 100.0, 100.0).is_empty());
    }

    #[test]
    fn scrub_updates_position_and_bar_synchronously() {
        let mut pool = pool_with_two_containers();
        let enter = pool.hover_enter(0);
        let PoolCommand::Seek {
            generation: hover_gen,
            ..
        } = enter[2]
        else {
            panic!("expected seek");
        };

        let commands = pool.scrub_begin(0, 150.0, 100.0, 100.0);
        assert_eq!(commands[0], PoolCommand::Pause);
        assert!(matches!(commands[1], PoolCommand::Seek { time, .. } if time == 2.0));
        assert!(matches!(
            commands[2],
            PoolCommand::RenderProgress { percent, .. } if percent == 50.0
        ));

        // The hover seek resolving mid-scrub must not start playback.
        assert!(pool.seek_completed(hover_gen).is_empty());

        // While dragging, timeupdates do not fight the scrub position.
        assert!(pool.time_update(0, 1.2).is_empty());

        let commands = pool.scrub_end(0, 200.0, 100.0, 100.0);
        assert!(matches!(commands[0], PoolCommand::Seek { time, .. } if time == 3.0));
        assert_eq!(commands[2], PoolCommand::Play);
        assert!(!pool.is_scrubbing());
    }
}

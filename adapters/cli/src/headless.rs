//! Backend and bookkeeping for runs without a window.

use anyhow::Result;
use libra_core::{EntityKind, Event, SoundCue};
use libra_rendering::{Frame, RenderingBackend};
use log::{debug, info};

/// Backend that counts what it would have drawn.
#[derive(Debug, Default)]
pub(crate) struct HeadlessBackend {
    frames: u64,
    vertices: u64,
}

impl HeadlessBackend {
    pub(crate) const fn vertices_presented(&self) -> u64 {
        self.vertices
    }
}

impl RenderingBackend for HeadlessBackend {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.frames += 1;
        self.vertices += frame.vertex_count() as u64;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        debug!("presented {} frames, {} vertices", self.frames, self.vertices);
        Ok(())
    }
}

/// Outcome of a headless run.
#[derive(Debug, Default)]
pub(crate) struct RunSummary {
    pub(crate) frames: u64,
    pub(crate) population: [usize; 8],
    pub(crate) tiles_destroyed: u32,
    pub(crate) agents_destroyed: [u32; 8],
    pub(crate) sound_cues: [u32; 4],
    pub(crate) player_deaths: u32,
    pub(crate) goal_reached: bool,
    pub(crate) vertices_presented: u64,
}

const CUES: [SoundCue; 4] = [
    SoundCue::Fire,
    SoundCue::Hit,
    SoundCue::Dead,
    SoundCue::FindPlayer,
];

impl RunSummary {
    /// Tallies the events of one frame.
    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TileDestroyed { .. } => self.tiles_destroyed += 1,
                Event::AgentDestroyed { kind, .. } => self.agents_destroyed[kind.index()] += 1,
                Event::SoundPlayed { cue } => {
                    if let Some(slot) = CUES.iter().position(|known| known == cue) {
                        self.sound_cues[slot] += 1;
                    }
                }
                _ => {}
            }
        }
    }

    pub(crate) fn log(&self) {
        info!("simulated {} frames", self.frames);
        for kind in EntityKind::ALL {
            let alive = self.population[kind.index()];
            let destroyed = self.agents_destroyed[kind.index()];
            if alive > 0 || destroyed > 0 {
                info!("{kind:?}: {alive} alive, {destroyed} destroyed");
            }
        }
        info!("tiles destroyed: {}", self.tiles_destroyed);
        for (cue, count) in CUES.iter().zip(self.sound_cues) {
            info!("sound {cue:?}: {count}");
        }
        info!(
            "player deaths: {}, goal reached: {}",
            self.player_deaths, self.goal_reached
        );
        debug!("vertices presented: {}", self.vertices_presented);
    }
}

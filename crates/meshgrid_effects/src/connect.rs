//! Connect effect.
//!
//! Periodically lights up short row and column segments of the lattice. The
//! grid is cut into square regions; each region gets a randomly placed
//! segment, and the segment lights up particle by particle so the highlight
//! sweeps along the line.
//!
//! ```text
//!      Building ──▶ Animating ──(all particles done)──▶ CoolingDown
//!         ▲                                                  │
//!         └──────────────────(cycle_delay)───────────────────┘
//!
//!   region 0          region 1
//!   ┌──────────┐      ┌──────────┐
//!   │ · · · · ·│      │ · ◆ · · ·│   parallel segments sit at least
//!   │ ◆ ◆ ◆ ◆ ◆│      │ · ◆ · · ·│   min_spacing lines apart; crossing
//!   │ · · · · ·│      │ · ◆ · · ·│   ones keep that gap between spans
//!   └──────────┘      └──────────┘
//! ```

use std::ops::Range;

use meshgrid_core::effect::prepare_buffer;
use meshgrid_core::grid::GridDims;
use meshgrid_core::options::Options;
use meshgrid_core::{
    Effect, EffectContribution, EffectOutput, EffectSetup, Frame, KeepAlive, Particle,
    Reinitialized,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::easing::Easing;

/// Registry name.
pub const NAME: &str = "connect";

/// Regions narrower than this in either direction get no segment.
pub const MIN_REGION: usize = 3;

/// How a lit particle fades over its animation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeMode {
    /// Fade in, then back out after `fade_out_start`.
    #[default]
    InOut,
    /// Fade in and stay lit until the cycle ends.
    Hold,
}

/// Connect tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectConfig {
    /// Region edge length in cells.
    pub region_size: usize,
    /// Segment length in cells, clipped only at the grid edge.
    pub group_length: usize,
    /// Segments attempted per region.
    pub groups_per_region: usize,
    /// Minimum spacing between segments, in cells. See [`Group::spaced_from`].
    pub min_spacing: usize,
    /// Rejection-sampling attempts per segment.
    pub max_attempts: usize,
    /// Opacity of unlit particles.
    pub base_opacity: f32,
    /// Opacity at the peak of the fade.
    pub highlight_opacity: f32,
    /// Delay between consecutive particles of a segment, seconds.
    pub particle_delay: f64,
    /// Per-particle animation length, seconds.
    pub duration: f64,
    /// Progress at which the fade-out begins (in-out mode).
    pub fade_out_start: f32,
    /// Pause between cycles, seconds.
    pub cycle_delay: f64,
    /// Earliest segment start after the cycle begins, seconds.
    pub offset_min: f64,
    /// Latest segment start after the cycle begins, seconds.
    pub offset_max: f64,
    /// Fade shape.
    pub mode: FadeMode,
}

impl ConnectConfig {
    /// Reads `connect-*` overrides.
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        let d = Self::default();
        let count = |key: &str, default: usize, min: f32| -> usize {
            #[allow(clippy::cast_precision_loss)]
            let value = options.number_where(key, default as f32, |v| v >= min);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let value = value.floor() as usize;
            value
        };
        let seconds = |key: &str, default: f64| -> f64 {
            options
                .number(key)
                .filter(|v| *v >= 0.0)
                .map_or(default, f64::from)
        };
        let unit = |key: &str, default: f32| {
            options.number_where(key, default, |v| (0.0..=1.0).contains(&v))
        };

        let mut config = Self {
            region_size: count("connect-region-size", d.region_size, 1.0),
            group_length: count("connect-group-length", d.group_length, 1.0),
            groups_per_region: count("connect-groups-per-region", d.groups_per_region, 0.0),
            min_spacing: count("connect-min-spacing", d.min_spacing, 0.0),
            max_attempts: count("connect-max-attempts", d.max_attempts, 1.0),
            base_opacity: unit("connect-base-opacity", d.base_opacity),
            highlight_opacity: unit("connect-highlight-opacity", d.highlight_opacity),
            particle_delay: seconds("connect-particle-delay", d.particle_delay),
            duration: seconds("connect-duration", d.duration),
            fade_out_start: options.number_where("connect-fade-out-start", d.fade_out_start, |v| {
                v > 0.0 && v < 1.0
            }),
            cycle_delay: seconds("connect-cycle-delay", d.cycle_delay),
            offset_min: seconds("connect-offset-min", d.offset_min),
            offset_max: seconds("connect-offset-max", d.offset_max),
            mode: match options.get("connect-mode").map(str::trim) {
                None | Some("in-out") => FadeMode::InOut,
                Some("hold") => FadeMode::Hold,
                Some(other) => {
                    tracing::warn!("unknown connect-mode {:?}, using in-out", other);
                    FadeMode::InOut
                }
            },
        };
        if config.offset_min > config.offset_max {
            std::mem::swap(&mut config.offset_min, &mut config.offset_max);
        }
        if config.duration <= 0.0 {
            config.duration = d.duration;
        }
        config
    }

    /// Opacity of a lit particle at animation progress `progress` (0-1).
    #[must_use]
    pub fn opacity_at(&self, progress: f32) -> f32 {
        let progress = progress.clamp(0.0, 1.0);
        let fade = match self.mode {
            FadeMode::Hold => progress,
            FadeMode::InOut => {
                let f = self.fade_out_start;
                if progress < f {
                    progress / f
                } else {
                    1.0 - (progress - f) / (1.0 - f)
                }
            }
        };
        self.base_opacity + (self.highlight_opacity - self.base_opacity) * Easing::CubicInOut.apply(fade)
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            region_size: 10,
            group_length: 10,
            groups_per_region: 1,
            min_spacing: 2,
            max_attempts: 8,
            base_opacity: 0.0,
            highlight_opacity: 1.0,
            particle_delay: 0.1,
            duration: 1.0,
            fade_out_start: 0.7,
            cycle_delay: 1.0,
            offset_min: 0.75,
            offset_max: 2.0,
            mode: FadeMode::InOut,
        }
    }
}

/// Direction of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Runs along a row (varying column).
    Row,
    /// Runs along a column (varying row).
    Column,
}

/// One lit segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Group {
    /// Direction.
    pub orientation: Orientation,
    /// Row index for `Row`, column index for `Column`.
    pub line: usize,
    /// First cell along the line.
    pub start: usize,
    /// One past the last cell along the line.
    pub end: usize,
    /// Time the first particle starts fading in.
    pub start_time: f64,
}

impl Group {
    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the segment has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Inclusive column span.
    #[must_use]
    pub fn col_span(&self) -> (usize, usize) {
        match self.orientation {
            Orientation::Row => (self.start, self.end - 1),
            Orientation::Column => (self.line, self.line),
        }
    }

    /// Inclusive row span.
    #[must_use]
    pub fn row_span(&self) -> (usize, usize) {
        match self.orientation {
            Orientation::Row => (self.line, self.line),
            Orientation::Column => (self.start, self.end - 1),
        }
    }

    /// Chebyshev gap in cells; 0 if the segments touch or cross.
    #[must_use]
    pub fn gap(&self, other: &Self) -> usize {
        span_gap(self.col_span(), other.col_span()).max(span_gap(self.row_span(), other.row_span()))
    }

    /// Returns true if `other` keeps at least `min_spacing` cells away.
    ///
    /// Parallel segments compare their perpendicular line offset. Crossing
    /// segments compare the row's span against the column's span.
    #[must_use]
    pub fn spaced_from(&self, other: &Self, min_spacing: usize) -> bool {
        if self.orientation == other.orientation {
            self.line.abs_diff(other.line) >= min_spacing
        } else {
            self.gap(other) >= min_spacing
        }
    }

    /// `(col, row)` cells in sweep order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.start..self.end).map(move |along| match self.orientation {
            Orientation::Row => (along, self.line),
            Orientation::Column => (self.line, along),
        })
    }
}

fn span_gap(a: (usize, usize), b: (usize, usize)) -> usize {
    if a.1 < b.0 {
        b.0 - a.1
    } else if b.1 < a.0 {
        a.0 - b.1
    } else {
        0
    }
}

/// Where the cycle state machine is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CyclePhase {
    /// A new placement is built on the next frame.
    Building,
    /// Segments are fading; the last particle finishes at `ends_at`.
    Animating {
        /// Time the last particle completes.
        ends_at: f64,
    },
    /// Waiting before the next placement.
    CoolingDown {
        /// Time the next cycle starts.
        until: f64,
    },
}

/// Cyclic row/column highlight sweeps.
#[derive(Debug)]
pub struct Connect {
    config: ConnectConfig,
    rng: ChaCha8Rng,
    dims: GridDims,
    generation: u64,
    groups: Vec<Group>,
    starts: Vec<Option<f64>>,
    phase: CyclePhase,
    keep_alive: KeepAlive,
}

impl Connect {
    /// Creates the effect from setup options.
    #[must_use]
    pub fn new(setup: EffectSetup<'_>) -> Self {
        Self::with_config(
            ConnectConfig::from_options(setup.options),
            &setup.grid,
            setup.keep_alive,
            setup.seed,
        )
    }

    /// Creates the effect with an explicit configuration and seed.
    #[must_use]
    pub fn with_config(config: ConnectConfig, grid: &Reinitialized, keep_alive: KeepAlive, seed: u64) -> Self {
        keep_alive.request();
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            dims: grid.dims,
            generation: grid.generation,
            groups: Vec::new(),
            starts: vec![None; grid.particle_count],
            phase: CyclePhase::Building,
            keep_alive,
        }
    }

    /// Segments of the current cycle.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Current cycle phase.
    #[must_use]
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    fn resync(&mut self, dims: GridDims, len: usize, generation: u64) {
        self.dims = dims;
        self.generation = generation;
        self.groups.clear();
        self.starts.clear();
        self.starts.resize(len, None);
        self.phase = CyclePhase::Building;
    }

    /// Places this cycle's segments and schedules their particles.
    fn build(&mut self, now: f64) {
        self.groups.clear();
        self.starts.fill(None);

        let GridDims { cols, rows } = self.dims;
        let region = self.config.region_size.max(1);
        for col0 in (0..cols).step_by(region) {
            for row0 in (0..rows).step_by(region) {
                let col_span = col0..(col0 + region).min(cols);
                let row_span = row0..(row0 + region).min(rows);
                if col_span.len() < MIN_REGION || row_span.len() < MIN_REGION {
                    continue;
                }
                for _ in 0..self.config.groups_per_region {
                    if let Some(group) = self.place(col_span.clone(), row_span.clone()) {
                        self.groups.push(group);
                    }
                }
            }
        }

        let cfg = self.config;
        let mut ends_at = now;
        for group in &mut self.groups {
            let offset = if cfg.offset_max > cfg.offset_min {
                self.rng.gen_range(cfg.offset_min..=cfg.offset_max)
            } else {
                cfg.offset_min
            };
            group.start_time = now + offset;

            for (position, (col, row)) in group.cells().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let start = group.start_time + position as f64 * cfg.particle_delay;
                let slot = &mut self.starts[self.dims.index(col, row)];
                let start = slot.map_or(start, |s| s.min(start));
                *slot = Some(start);
                ends_at = ends_at.max(start + cfg.duration);
            }
        }

        tracing::trace!("connect cycle built: {} groups", self.groups.len());
        self.phase = CyclePhase::Animating { ends_at };
    }

    /// Rejection-samples one segment inside a region.
    fn place(&mut self, cols: Range<usize>, rows: Range<usize>) -> Option<Group> {
        for _ in 0..self.config.max_attempts {
            let orientation = if self.rng.gen_bool(0.5) {
                Orientation::Row
            } else {
                Orientation::Column
            };
            let (lines, along, extent) = match orientation {
                Orientation::Row => (rows.clone(), cols.clone(), self.dims.cols),
                Orientation::Column => (cols.clone(), rows.clone(), self.dims.rows),
            };
            let line = self.rng.gen_range(lines);
            let len = self.config.group_length.max(1);
            // Starts inside the region; long segments run on into the next one
            let latest = along.end.saturating_sub(len).max(along.start);
            let start = self.rng.gen_range(along.start..=latest);
            let candidate = Group {
                orientation,
                line,
                start,
                end: (start + len).min(extent),
                start_time: 0.0,
            };

            let min_spacing = self.config.min_spacing;
            if self.groups.iter().all(|g| g.spaced_from(&candidate, min_spacing)) {
                return Some(candidate);
            }
        }
        None
    }
}

impl Effect for Connect {
    fn name(&self) -> &'static str {
        NAME
    }

    fn update_particles(
        &mut self,
        frame: &Frame,
        particles: &[Particle],
        out: &mut Vec<EffectContribution>,
    ) -> EffectOutput {
        if particles.is_empty() || frame.dims.len() != particles.len() {
            return EffectOutput::Skip;
        }
        if self.starts.len() != particles.len()
            || self.generation != frame.generation
            || self.dims != frame.dims
        {
            self.resync(frame.dims, particles.len(), frame.generation);
        }
        self.keep_alive.request();

        let now = frame.now;
        if let CyclePhase::CoolingDown { until } = self.phase {
            if now >= until {
                self.phase = CyclePhase::Building;
            }
        }
        if self.phase == CyclePhase::Building {
            self.build(now);
        }
        if let CyclePhase::Animating { ends_at } = self.phase {
            if now >= ends_at {
                self.phase = CyclePhase::CoolingDown {
                    until: now + self.config.cycle_delay,
                };
            }
        }

        let cfg = self.config;
        prepare_buffer(out, particles.len());
        for (start, slot) in self.starts.iter().zip(out.iter_mut()) {
            let opacity = match *start {
                None => cfg.base_opacity,
                #[allow(clippy::cast_possible_truncation)]
                Some(start) => cfg.opacity_at(((now - start) / cfg.duration).clamp(0.0, 1.0) as f32),
            };
            *slot = EffectContribution {
                opacity: Some(opacity),
                ..EffectContribution::NONE
            };
        }

        EffectOutput::Written
    }

    fn particles_reinitialized(&mut self, notice: &Reinitialized) {
        self.resync(notice.dims, notice.particle_count, notice.generation);
    }

    fn is_active(&self) -> bool {
        matches!(self.phase, CyclePhase::Animating { .. })
    }

    fn state_len(&self) -> usize {
        self.starts.len()
    }
}

/// Registry constructor.
#[must_use]
pub fn construct(setup: EffectSetup<'_>) -> Option<Box<dyn Effect>> {
    Some(Box::new(Connect::new(setup)))
}

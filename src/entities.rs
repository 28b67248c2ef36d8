/// All game entity types and static layout data. Pure data, no logic;
/// every rule that moves these values lives in `compute`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::geometry::{Rect, Vec2};

// ── Playfield layout ──────────────────────────────────────────────────────────

/// Logical playfield extent. All simulation coordinates live in this
/// space; the presentation layer maps device coordinates into it.
pub const PLAYFIELD: Vec2 = Vec2::new(480.0, 320.0);

/// Tap region that starts a game from the title screen.
pub const START_BUTTON: Rect = Rect::new(160.0, 138.0, 160.0, 44.0);

/// Tap region that restarts from the game-over screen (same spot).
pub const RESTART_BUTTON: Rect = START_BUTTON;

/// Bottom strip; tapping it requests a reload instead of firing.
pub const RELOAD_REGION: Rect = Rect::new(0.0, 290.0, 480.0, 30.0);

// ── Cover slots ───────────────────────────────────────────────────────────────

/// Purely visual flavour of a hiding spot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoverKind {
    Barrel,
    Crate,
    Rock,
    Sandbags,
}

/// One of the 4 fixed hiding spots. Slots never move and are never
/// created or destroyed while the process lives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverSlot {
    pub id: usize,
    pub center: Vec2,
    pub size: Vec2,
    pub kind: CoverKind,
}

pub static COVER_SLOTS: [CoverSlot; 4] = [
    CoverSlot {
        id: 0,
        center: Vec2::new(75.0, 220.0),
        size: Vec2::new(64.0, 58.0),
        kind: CoverKind::Barrel,
    },
    CoverSlot {
        id: 1,
        center: Vec2::new(185.0, 220.0),
        size: Vec2::new(64.0, 58.0),
        kind: CoverKind::Crate,
    },
    CoverSlot {
        id: 2,
        center: Vec2::new(295.0, 220.0),
        size: Vec2::new(64.0, 58.0),
        kind: CoverKind::Rock,
    },
    CoverSlot {
        id: 3,
        center: Vec2::new(405.0, 220.0),
        size: Vec2::new(64.0, 58.0),
        kind: CoverKind::Sandbags,
    },
];

// ── Enemies ───────────────────────────────────────────────────────────────────

/// Cosmetic outfit variant, rolled at spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outfit {
    Poncho,
    Duster,
    Vest,
}

/// Behavior phase. Each variant carries only the timers that phase
/// reads, so an enemy can never act on a stale countdown.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EnemyPhase {
    /// Walking in from the screen edge toward the assigned cover.
    Entering {
        /// Counts down to the next flip of the two-frame walk cycle.
        step_timer: f32,
        /// Which of the two walk frames is showing.
        stride: bool,
    },
    /// Ducked behind cover. Invisible and untouchable.
    Hiding { dwell: f32 },
    /// Top sliver showing, alert pulsing. The player may preempt here.
    Warning { left: f32 },
    /// Fully exposed and armed. When `left` runs out the shot commits.
    Peeking { left: f32 },
    /// Post-shot recoil pose.
    Shooting { recover: f32 },
    /// Flinching back after non-fatal damage.
    Retreating { left: f32 },
    /// Sinking out of view; removed once `sink` runs out.
    Dead { sink: f32 },
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: u32,
    /// Index into `COVER_SLOTS`. At most one non-Dead enemy per slot.
    pub slot: usize,
    pub hp: u32,
    pub max_hp: u32,
    pub outfit: Outfit,
    /// Interpolated while Entering; pinned to the slot centre afterwards.
    pub pos: Vec2,
    pub phase: EnemyPhase,
}

// ── Particles ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleKind {
    /// Player's shot flash at the tap point.
    MuzzleFlash,
    Blood,
    /// Decal left by a missed shot.
    BulletHole,
    HitFlash,
    /// Flash at an enemy's gun when its shot commits.
    EnemyFlash,
}

/// Transient visual feedback. No identity; order is irrelevant.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: ParticleKind,
    pub life: f32,
    pub life_max: f32,
}

// ── Player resources ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerResources {
    /// Rounds in the cylinder, 0..=6. Only a completed reload refills it.
    pub ammo: u32,
    /// Remaining reload time; `None` when not reloading.
    pub reload: Option<f32>,
    /// 0..=3.
    pub lives: u32,
    pub score: u32,
}

// ── Wave state ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct WaveState {
    pub number: u32,
    /// Enemies introduced so far this wave.
    pub spawned: u32,
    /// Kills so far this wave.
    pub killed: u32,
    /// Kills required to clear the wave.
    pub target: u32,
    pub spawn_interval: f32,
    pub spawn_countdown: f32,
    /// Remaining display time of the wave announcement banner.
    pub banner: f32,
}

// ── Session ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    NotStarted,
    Active,
    Ended,
}

/// A delayed side effect. Fired by `compute::step` once its due time
/// passes; every action re-checks liveness at fire time, so a stale
/// event goes inert instead of corrupting state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DeferredAction {
    /// An enemy committed its shot; the hit lands unless it died mid-draw.
    EnemyShotLands { enemy: u32 },
    /// The cylinder ran dry; begin reloading unless one is underway.
    AutoReload,
    /// The wave's kill target was reached; advance unless the wave moved on.
    AdvanceWave { from_wave: u32 },
    /// Lives hit zero; end the session if it is still running.
    EndSession,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledEvent {
    /// Session-clock second at which the action fires.
    pub due: f64,
    pub action: DeferredAction,
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the soonest event sits on top of the max-heap.
        other.due.total_cmp(&self.due)
    }
}

/// The entire simulation. Constructed explicitly and passed into the
/// `compute` functions; nothing global, so tests can run many at once.
#[derive(Clone, Debug)]
pub struct GameSession {
    pub mode: SessionMode,
    /// Seconds of simulated time. Advances only while Active.
    pub clock: f64,
    pub enemies: Vec<Enemy>,
    pub particles: Vec<Particle>,
    pub resources: PlayerResources,
    pub wave: WaveState,
    /// Damage pulse countdown for the presentation layer.
    pub screen_flash: f32,
    /// Highest score seen since process start. Survives restarts.
    pub best_score: u32,
    /// Pending deferred actions, soonest first.
    pub events: BinaryHeap<ScheduledEvent>,
    pub next_enemy_id: u32,
}

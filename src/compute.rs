/// The whole simulation. Every public function takes the session by
/// mutable reference (no globals, so tests can drive several sessions
/// side by side) and, where randomness is involved, an RNG handle so
/// callers control determinism with a seeded generator.
///
/// The session only advances inside `step`; input handlers enqueue
/// nothing and resolve synchronously against the current state.

use rand::Rng;
use tracing::{debug, info};

use crate::entities::{
    CoverSlot, DeferredAction, Enemy, EnemyPhase, GameSession, Outfit, Particle, ParticleKind,
    PlayerResources, ScheduledEvent, SessionMode, WaveState, COVER_SLOTS, PLAYFIELD,
    RELOAD_REGION, RESTART_BUTTON, START_BUTTON,
};
use crate::geometry::{Rect, Vec2};

// ── Resource limits ───────────────────────────────────────────────────────────

pub const AMMO_MAX: u32 = 6;
pub const LIVES_MAX: u32 = 3;

// ── Timing tables ─────────────────────────────────────────────────────────────

/// Upper bound on one simulation step. A stalled host (backgrounded
/// terminal, debugger pause) resumes without a runaway catch-up step.
pub const MAX_STEP_SECONDS: f32 = 0.05;

/// Randomized dwell behind cover, uniform seconds.
pub const HIDE_DWELL: (f32, f32) = (0.8, 2.2);
/// Randomized telegraph duration before the peek.
pub const WARNING_TIME: (f32, f32) = (0.5, 0.9);
/// Randomized window the player has to land a shot before the enemy fires.
pub const PEEK_TIME: (f32, f32) = (0.9, 1.6);
pub const SHOOT_RECOVER_SECONDS: f32 = 0.45;
pub const RETREAT_SECONDS: f32 = 0.35;
/// How long a dead enemy keeps sinking before removal.
pub const DEATH_SINK_SECONDS: f32 = 0.8;
/// Gap between the shot committing and the hit landing on the player.
pub const SHOT_IMPACT_DELAY: f64 = 0.18;
/// Gap between running dry and the automatic reload kicking in.
pub const AUTO_RELOAD_DELAY: f64 = 0.35;
pub const RELOAD_SECONDS: f32 = 1.2;
/// Gap between the closing kill and the wave rollover.
pub const WAVE_ADVANCE_DELAY: f64 = 1.2;
/// Gap between losing the last life and the session ending.
pub const GAME_OVER_DELAY: f64 = 1.4;
pub const BANNER_SECONDS: f32 = 1.6;
pub const SCREEN_FLASH_SECONDS: f32 = 0.25;
/// Countdown to the first spawn attempt of a fresh game.
pub const FIRST_SPAWN_DELAY: f32 = 0.7;
const SPAWN_JITTER_MAX: f32 = 0.4;
/// Walk-cycle flip cadence while Entering.
const STRIDE_SECONDS: f32 = 0.14;

// ── Difficulty tables ─────────────────────────────────────────────────────────

/// Simultaneous non-Dead enemies allowed during wave `n`.
pub fn concurrency_cap(wave: u32) -> u32 {
    (2 + wave * 3 / 5).clamp(1, 4)
}

/// Kills required to clear wave `n`.
pub fn wave_target(wave: u32) -> u32 {
    5 + wave * 2
}

/// Hit points per enemy spawned during wave `n`.
pub fn enemy_hit_points(wave: u32) -> u32 {
    if wave >= 3 {
        2
    } else {
        1
    }
}

/// Base seconds between spawn attempts, tightening each wave.
pub fn spawn_interval(wave: u32) -> f32 {
    (2.3 - wave as f32 * 0.15).max(1.1)
}

/// Entry walk speed in playfield units per second.
pub fn entry_speed(wave: u32) -> f32 {
    55.0 + wave as f32 * 9.0
}

/// Points awarded for a kill during wave `n`.
pub fn kill_score(wave: u32) -> u32 {
    100 * wave
}

// ── Enemy body metrics ────────────────────────────────────────────────────────

const BODY_W: f32 = 36.0;
const PEEK_H: f32 = 44.0;
const SLIVER_H: f32 = 12.0;
const RETREAT_H: f32 = 24.0;
/// How far the exposed poses overlap the cover top.
const PEEK_OVERLAP: f32 = 10.0;

// ── Particle feedback ─────────────────────────────────────────────────────────

const MUZZLE_FLASH_LIFE: f32 = 0.08;
const BLOOD_LIFE: f32 = 0.5;
const BULLET_HOLE_LIFE: f32 = 2.5;
const HIT_FLASH_LIFE: f32 = 0.15;
const ENEMY_FLASH_LIFE: f32 = 0.12;
const BLOOD_SPRAY: u32 = 4;

// ── Constructors ──────────────────────────────────────────────────────────────

/// Build an idle session. Nothing simulates until `start` is issued.
pub fn new_session() -> GameSession {
    GameSession {
        mode: SessionMode::NotStarted,
        clock: 0.0,
        enemies: Vec::new(),
        particles: Vec::new(),
        resources: PlayerResources {
            ammo: AMMO_MAX,
            reload: None,
            lives: LIVES_MAX,
            score: 0,
        },
        wave: WaveState {
            number: 1,
            spawned: 0,
            killed: 0,
            target: wave_target(1),
            spawn_interval: spawn_interval(1),
            spawn_countdown: FIRST_SPAWN_DELAY,
            banner: 0.0,
        },
        screen_flash: 0.0,
        best_score: 0,
        events: std::collections::BinaryHeap::new(),
        next_enemy_id: 0,
    }
}

/// Begin (or restart) a game. Every dynamic structure returns to its
/// initial value; only the best score carries over.
pub fn start(session: &mut GameSession) {
    session.mode = SessionMode::Active;
    session.clock = 0.0;
    session.enemies.clear();
    session.particles.clear();
    session.events.clear();
    session.resources = PlayerResources {
        ammo: AMMO_MAX,
        reload: None,
        lives: LIVES_MAX,
        score: 0,
    };
    session.wave = WaveState {
        number: 1,
        spawned: 0,
        killed: 0,
        target: wave_target(1),
        spawn_interval: spawn_interval(1),
        spawn_countdown: FIRST_SPAWN_DELAY,
        banner: BANNER_SECONDS,
    };
    session.screen_flash = 0.0;
    session.next_enemy_id = 0;
    info!("session started");
}

// ── Derived enemy queries ─────────────────────────────────────────────────────

pub fn enemy_slot(enemy: &Enemy) -> &'static CoverSlot {
    &COVER_SLOTS[enemy.slot]
}

fn cover_top(slot: &CoverSlot) -> f32 {
    slot.center.y - slot.size.y / 2.0
}

/// Whether the renderer should draw this enemy at all.
pub fn enemy_visible(enemy: &Enemy) -> bool {
    !matches!(enemy.phase, EnemyPhase::Hiding { .. })
}

/// The tappable region, if any. Entering enemies are visible but carry
/// no hitbox: they walk in on the layer above cover, outside the firing
/// plane, and cannot be shot until they first reach their slot.
pub fn enemy_hitbox(enemy: &Enemy) -> Option<Rect> {
    let slot = enemy_slot(enemy);
    let top = cover_top(slot);
    let left = slot.center.x - BODY_W / 2.0;
    match enemy.phase {
        EnemyPhase::Warning { .. } => Some(Rect::new(left, top - SLIVER_H, BODY_W, SLIVER_H)),
        EnemyPhase::Peeking { .. } | EnemyPhase::Shooting { .. } => Some(Rect::new(
            left,
            top - (PEEK_H - PEEK_OVERLAP),
            BODY_W,
            PEEK_H,
        )),
        EnemyPhase::Retreating { .. } => Some(Rect::new(
            left,
            top - RETREAT_H,
            BODY_W,
            RETREAT_H + PEEK_OVERLAP,
        )),
        EnemyPhase::Entering { .. } | EnemyPhase::Hiding { .. } | EnemyPhase::Dead { .. } => None,
    }
}

/// Announcement banner opacity: ramps up across the first half of the
/// display window and back down across the second.
pub fn banner_alpha(wave: &WaveState) -> f32 {
    if wave.banner <= 0.0 {
        return 0.0;
    }
    let progress = 1.0 - (wave.banner / BANNER_SECONDS).clamp(0.0, 1.0);
    1.0 - (2.0 * progress - 1.0).abs()
}

// ── Input commands ────────────────────────────────────────────────────────────

/// One normalized pointer tap in playfield coordinates. Routing depends
/// on the session mode: menus only test their buttons, an active game
/// splits between the reload strip and the firing range.
pub fn handle_tap(session: &mut GameSession, point: Vec2, rng: &mut impl Rng) {
    match session.mode {
        SessionMode::NotStarted => {
            if START_BUTTON.contains(point) {
                start(session);
            }
        }
        SessionMode::Ended => {
            if RESTART_BUTTON.contains(point) {
                start(session);
            }
        }
        SessionMode::Active => {
            if RELOAD_REGION.contains(point) {
                reload(session);
            } else {
                fire(session, point, rng);
            }
        }
    }
}

/// Squeeze the trigger at `point`. With an empty or cycling gun the tap
/// is interpreted as a reload request, not a shot.
pub fn fire(session: &mut GameSession, point: Vec2, rng: &mut impl Rng) {
    if session.mode != SessionMode::Active {
        return;
    }
    if session.resources.reload.is_some() || session.resources.ammo == 0 {
        reload(session);
        return;
    }

    session.resources.ammo -= 1;
    spawn_particle(session, point, Vec2::default(), ParticleKind::MuzzleFlash, MUZZLE_FLASH_LIFE);

    // First hitbox in natural order wins; no prioritization beyond that.
    let hit = session
        .enemies
        .iter()
        .position(|e| enemy_hitbox(e).map_or(false, |r| r.contains(point)));
    match hit {
        Some(index) => apply_hit(session, index, rng),
        None => spawn_particle(
            session,
            point,
            Vec2::default(),
            ParticleKind::BulletHole,
            BULLET_HOLE_LIFE,
        ),
    }

    if session.resources.ammo == 0 {
        schedule(session, AUTO_RELOAD_DELAY, DeferredAction::AutoReload);
    }
}

/// Begin reloading. Already reloading or a full cylinder makes this a
/// no-op, so repeated requests never reset the countdown.
pub fn reload(session: &mut GameSession) {
    if session.mode != SessionMode::Active {
        return;
    }
    if session.resources.reload.is_some() || session.resources.ammo == AMMO_MAX {
        return;
    }
    session.resources.reload = Some(RELOAD_SECONDS);
}

/// Landed enemy fire. Ignored once the session is over.
pub fn damage_player(session: &mut GameSession) {
    if session.mode != SessionMode::Active {
        return;
    }
    let before = session.resources.lives;
    session.resources.lives = session.resources.lives.saturating_sub(1);
    session.screen_flash = SCREEN_FLASH_SECONDS;
    if before > 0 && session.resources.lives == 0 {
        session.best_score = session.best_score.max(session.resources.score);
        info!(score = session.resources.score, "out of lives");
        schedule(session, GAME_OVER_DELAY, DeferredAction::EndSession);
    }
}

/// Resolve one landed tap on `session.enemies[index]`. Feedback
/// particles fly whether or not the hit kills.
fn apply_hit(session: &mut GameSession, index: usize, rng: &mut impl Rng) {
    let burst_at = enemy_hitbox(&session.enemies[index])
        .map(|r| r.center())
        .unwrap_or(session.enemies[index].pos);
    spawn_particle(session, burst_at, Vec2::default(), ParticleKind::HitFlash, HIT_FLASH_LIFE);
    for _ in 0..BLOOD_SPRAY {
        let vel = Vec2::new(rng.gen_range(-60.0..60.0), rng.gen_range(-80.0..-20.0));
        spawn_particle(session, burst_at, vel, ParticleKind::Blood, BLOOD_LIFE);
    }

    let (fatal, enemy_id) = {
        let enemy = &mut session.enemies[index];
        enemy.hp = enemy.hp.saturating_sub(1);
        if enemy.hp == 0 {
            enemy.phase = EnemyPhase::Dead {
                sink: DEATH_SINK_SECONDS,
            };
            (true, enemy.id)
        } else {
            enemy.phase = EnemyPhase::Retreating {
                left: RETREAT_SECONDS,
            };
            (false, enemy.id)
        }
    };

    if fatal {
        let wave_number = session.wave.number;
        session.resources.score += kill_score(wave_number);
        session.wave.killed += 1;
        debug!(enemy = enemy_id, wave = wave_number, "enemy down");
        if session.wave.killed >= session.wave.target {
            schedule(
                session,
                WAVE_ADVANCE_DELAY,
                DeferredAction::AdvanceWave {
                    from_wave: wave_number,
                },
            );
        }
    }
}

// ── Per-frame step ────────────────────────────────────────────────────────────

/// Advance the simulation by `dt` seconds of wall-clock time.
///
/// Outside Active the host keeps calling this for input/presentation
/// cadence, but nothing advances; inside, the clock moves, due deferred
/// events fire, and every subsystem takes its slice of `dt`.
pub fn step(session: &mut GameSession, dt: f32, rng: &mut impl Rng) {
    let dt = dt.clamp(0.0, MAX_STEP_SECONDS);
    if session.mode != SessionMode::Active {
        return;
    }

    session.clock += f64::from(dt);
    fire_due_events(session, rng);
    update_reload(session, dt);
    run_spawn_director(session, dt, rng);
    update_enemies(session, dt, rng);
    update_particles(session, dt);
    session.wave.banner = (session.wave.banner - dt).max(0.0);
    session.screen_flash = (session.screen_flash - dt).max(0.0);
}

fn update_particles(session: &mut GameSession, dt: f32) {
    for p in &mut session.particles {
        p.pos = p.pos + p.vel * dt;
        p.life -= dt;
    }
    session.particles.retain(|p| p.life > 0.0);
}

fn update_reload(session: &mut GameSession, dt: f32) {
    if let Some(left) = session.resources.reload {
        let left = left - dt;
        if left <= 0.0 {
            session.resources.ammo = AMMO_MAX;
            session.resources.reload = None;
        } else {
            session.resources.reload = Some(left);
        }
    }
}

// ── Deferred events ───────────────────────────────────────────────────────────

fn schedule(session: &mut GameSession, delay: f64, action: DeferredAction) {
    session.events.push(ScheduledEvent {
        due: session.clock + delay,
        action,
    });
}

fn fire_due_events(session: &mut GameSession, rng: &mut impl Rng) {
    while let Some(next) = session.events.peek().copied() {
        if next.due > session.clock {
            break;
        }
        session.events.pop();
        apply_deferred(session, next.action, rng);
    }
}

fn apply_deferred(session: &mut GameSession, action: DeferredAction, rng: &mut impl Rng) {
    match action {
        DeferredAction::EnemyShotLands { enemy } => {
            // Cancelled mid-air if the shooter died after committing.
            let shooter_alive = session
                .enemies
                .iter()
                .any(|e| e.id == enemy && !matches!(e.phase, EnemyPhase::Dead { .. }));
            if shooter_alive {
                damage_player(session);
            }
        }
        DeferredAction::AutoReload => reload(session),
        DeferredAction::AdvanceWave { from_wave } => {
            if session.wave.number == from_wave {
                advance_wave(session, rng);
            }
        }
        DeferredAction::EndSession => {
            if session.mode == SessionMode::Active {
                session.best_score = session.best_score.max(session.resources.score);
                session.mode = SessionMode::Ended;
                info!(
                    score = session.resources.score,
                    best = session.best_score,
                    "session ended"
                );
            }
        }
    }
}

// ── Wave director ─────────────────────────────────────────────────────────────

fn run_spawn_director(session: &mut GameSession, dt: f32, rng: &mut impl Rng) {
    session.wave.spawn_countdown -= dt;
    if session.wave.spawn_countdown > 0.0 {
        return;
    }
    // Rearm on the normal schedule whether or not the attempt lands.
    session.wave.spawn_countdown =
        session.wave.spawn_interval + rng.gen_range(0.0..SPAWN_JITTER_MAX);
    try_spawn(session, rng);
}

/// A slot is taken while any non-Dead enemy is assigned to it.
fn slot_occupied(session: &GameSession, slot: usize) -> bool {
    session
        .enemies
        .iter()
        .any(|e| e.slot == slot && !matches!(e.phase, EnemyPhase::Dead { .. }))
}

fn try_spawn(session: &mut GameSession, rng: &mut impl Rng) {
    let wave = session.wave.number;
    let active = session
        .enemies
        .iter()
        .filter(|e| !matches!(e.phase, EnemyPhase::Dead { .. }))
        .count() as u32;
    if active >= concurrency_cap(wave) || session.wave.spawned >= session.wave.target {
        return;
    }

    let free: Vec<usize> = COVER_SLOTS
        .iter()
        .map(|s| s.id)
        .filter(|id| !slot_occupied(session, *id))
        .collect();
    if free.is_empty() {
        // Abandoned; the next attempt comes on the regular schedule.
        return;
    }
    let slot = free[rng.gen_range(0..free.len())];

    let slot_center = COVER_SLOTS[slot].center;
    let from_left = slot_center.x < PLAYFIELD.x / 2.0;
    let start_x = if from_left { -BODY_W } else { PLAYFIELD.x + BODY_W };
    let outfit = match rng.gen_range(0..3) {
        0 => Outfit::Poncho,
        1 => Outfit::Duster,
        _ => Outfit::Vest,
    };
    let hp = enemy_hit_points(wave);
    let id = session.next_enemy_id;
    session.next_enemy_id += 1;
    session.wave.spawned += 1;
    debug!(enemy = id, slot, "spawn");
    session.enemies.push(Enemy {
        id,
        slot,
        hp,
        max_hp: hp,
        outfit,
        pos: Vec2::new(start_x, slot_center.y),
        phase: EnemyPhase::Entering {
            step_timer: STRIDE_SECONDS,
            stride: false,
        },
    });
}

/// Roll over to the next wave: counters reset, pacing recomputed, every
/// remaining enemy cleared no matter what it was doing.
fn advance_wave(session: &mut GameSession, rng: &mut impl Rng) {
    session.wave.number += 1;
    let n = session.wave.number;
    session.wave.spawned = 0;
    session.wave.killed = 0;
    session.wave.target = wave_target(n);
    session.wave.spawn_interval = spawn_interval(n);
    session.wave.spawn_countdown =
        session.wave.spawn_interval + rng.gen_range(0.0..SPAWN_JITTER_MAX);
    session.wave.banner = BANNER_SECONDS;
    session.enemies.clear();
    info!(wave = n, target = session.wave.target, "wave advanced");
}

// ── Enemy behavior machine ────────────────────────────────────────────────────

fn update_enemies(session: &mut GameSession, dt: f32, rng: &mut impl Rng) {
    let mut enemies = std::mem::take(&mut session.enemies);
    for enemy in &mut enemies {
        advance_enemy(session, enemy, dt, rng);
    }
    enemies.retain(|e| !matches!(e.phase, EnemyPhase::Dead { sink } if sink <= 0.0));
    session.enemies = enemies;
}

fn advance_enemy(session: &mut GameSession, enemy: &mut Enemy, dt: f32, rng: &mut impl Rng) {
    let slot_center = COVER_SLOTS[enemy.slot].center;
    let next = match enemy.phase {
        EnemyPhase::Entering {
            mut step_timer,
            mut stride,
        } => {
            step_timer -= dt;
            while step_timer <= 0.0 {
                stride = !stride;
                step_timer += STRIDE_SECONDS;
            }
            let step = entry_speed(session.wave.number) * dt;
            let dx = slot_center.x - enemy.pos.x;
            if dx.abs() <= step {
                enemy.pos = slot_center;
                EnemyPhase::Hiding {
                    dwell: rng.gen_range(HIDE_DWELL.0..HIDE_DWELL.1),
                }
            } else {
                enemy.pos.x += step * dx.signum();
                EnemyPhase::Entering { step_timer, stride }
            }
        }
        EnemyPhase::Hiding { dwell } => {
            let dwell = dwell - dt;
            if dwell <= 0.0 {
                EnemyPhase::Warning {
                    left: rng.gen_range(WARNING_TIME.0..WARNING_TIME.1),
                }
            } else {
                EnemyPhase::Hiding { dwell }
            }
        }
        EnemyPhase::Warning { left } => {
            let left = left - dt;
            if left <= 0.0 {
                EnemyPhase::Peeking {
                    left: rng.gen_range(PEEK_TIME.0..PEEK_TIME.1),
                }
            } else {
                EnemyPhase::Warning { left }
            }
        }
        EnemyPhase::Peeking { left } => {
            let left = left - dt;
            if left <= 0.0 {
                commit_shot(session, enemy.id, enemy.slot);
                EnemyPhase::Shooting {
                    recover: SHOOT_RECOVER_SECONDS,
                }
            } else {
                EnemyPhase::Peeking { left }
            }
        }
        EnemyPhase::Shooting { recover } => {
            let recover = recover - dt;
            if recover <= 0.0 {
                EnemyPhase::Hiding {
                    dwell: rng.gen_range(HIDE_DWELL.0..HIDE_DWELL.1),
                }
            } else {
                EnemyPhase::Shooting { recover }
            }
        }
        EnemyPhase::Retreating { left } => {
            let left = left - dt;
            if left <= 0.0 {
                EnemyPhase::Hiding {
                    dwell: rng.gen_range(HIDE_DWELL.0..HIDE_DWELL.1),
                }
            } else {
                EnemyPhase::Retreating { left }
            }
        }
        EnemyPhase::Dead { sink } => EnemyPhase::Dead { sink: sink - dt },
    };
    enemy.phase = next;
}

/// The peek window closed: the shot is committed now, the hit lands a
/// beat later so the muzzle flash reads before the damage.
fn commit_shot(session: &mut GameSession, enemy_id: u32, slot: usize) {
    let sc = &COVER_SLOTS[slot];
    let muzzle = Vec2::new(
        sc.center.x + BODY_W / 2.0,
        cover_top(sc) - PEEK_H + PEEK_OVERLAP + 12.0,
    );
    spawn_particle(session, muzzle, Vec2::default(), ParticleKind::EnemyFlash, ENEMY_FLASH_LIFE);
    schedule(
        session,
        SHOT_IMPACT_DELAY,
        DeferredAction::EnemyShotLands { enemy: enemy_id },
    );
    debug!(enemy = enemy_id, "shot committed");
}

// ── Particles ─────────────────────────────────────────────────────────────────

fn spawn_particle(session: &mut GameSession, pos: Vec2, vel: Vec2, kind: ParticleKind, life: f32) {
    session.particles.push(Particle {
        pos,
        vel,
        kind,
        life,
        life_max: life,
    });
}

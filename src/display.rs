/// Rendering layer — all terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// session.  No game logic is performed; this module only translates
/// state into terminal commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};

use shooting_gallery::compute::{
    banner_alpha, enemy_hitbox, enemy_visible, AMMO_MAX, DEATH_SINK_SECONDS, RELOAD_SECONDS,
};
use shooting_gallery::entities::{
    CoverKind, Enemy, EnemyPhase, GameSession, Outfit, Particle, ParticleKind, SessionMode,
    COVER_SLOTS, PLAYFIELD, RELOAD_REGION, RESTART_BUTTON, START_BUTTON,
};
use shooting_gallery::geometry::{Rect, Vec2, Viewport};

/// Terminal cells are roughly twice as tall as wide; mapping each cell
/// to a 1x2 block keeps the playfield proportions on screen.
pub const CELL_ASPECT: f32 = 2.0;

/// The letterbox transform for the current terminal size.
pub fn viewport_for(cols: u16, rows: u16) -> Viewport {
    Viewport::fit(
        PLAYFIELD,
        Vec2::new(f32::from(cols), f32::from(rows) * CELL_ASPECT),
    )
}

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_BORDER_HIT: Color = Color::Red;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_WAVE: Color = Color::Green;
const C_HUD_LIVES: Color = Color::Red;
const C_HUD_AMMO: Color = Color::Cyan;
const C_COVER: Color = Color::DarkYellow;
const C_ENEMY: Color = Color::Green;
const C_ALERT: Color = Color::Yellow;
const C_ENEMY_DEAD: Color = Color::DarkGrey;
const C_BLOOD: Color = Color::Red;
const C_HOLE: Color = Color::DarkGrey;
const C_FLASH: Color = Color::Yellow;
const C_HINT: Color = Color::DarkGrey;

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(
    out: &mut W,
    session: &GameSession,
    vp: &Viewport,
    cols: u16,
    rows: u16,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, session, vp)?;
    draw_hud(out, session, cols)?;

    match session.mode {
        SessionMode::NotStarted => draw_title(out, session, vp)?,
        SessionMode::Active | SessionMode::Ended => {
            // Exposed enemies sit behind cover; entering ones walk in
            // front of it.  The hit test mirrors this layering.
            for enemy in session.enemies.iter().filter(|e| behind_cover(e)) {
                draw_enemy(out, enemy, vp)?;
            }
            draw_covers(out, vp)?;
            for enemy in session.enemies.iter().filter(|e| entering(e)) {
                draw_enemy(out, enemy, vp)?;
            }
            for particle in &session.particles {
                draw_particle(out, particle, vp)?;
            }
            draw_reload_strip(out, session, vp)?;
            if session.wave.banner > 0.0 {
                draw_banner(out, session, vp)?;
            }
            if session.mode == SessionMode::Ended {
                draw_game_over(out, session, vp)?;
            }
        }
    }

    draw_controls_hint(out, rows)?;

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

fn entering(enemy: &Enemy) -> bool {
    matches!(enemy.phase, EnemyPhase::Entering { .. })
}

fn behind_cover(enemy: &Enemy) -> bool {
    enemy_visible(enemy) && !entering(enemy)
}

// ── Projection helpers ────────────────────────────────────────────────────────

fn cell(vp: &Viewport, p: Vec2) -> (i32, i32) {
    let d = vp.to_device(p);
    (d.x.round() as i32, (d.y / CELL_ASPECT).round() as i32)
}

/// Queue `text` at a cell position, silently dropping off-screen rows.
fn put<W: Write>(out: &mut W, col: i32, row: i32, text: &str, color: Color) -> std::io::Result<()> {
    if col < 0 || row < 0 || col > u16::MAX as i32 || row > u16::MAX as i32 {
        return Ok(());
    }
    out.queue(cursor::MoveTo(col as u16, row as u16))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

fn put_centered<W: Write>(
    out: &mut W,
    center_col: i32,
    row: i32,
    text: &str,
    color: Color,
) -> std::io::Result<()> {
    let col = center_col - text.chars().count() as i32 / 2;
    put(out, col, row, text, color)
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(
    out: &mut W,
    session: &GameSession,
    vp: &Viewport,
) -> std::io::Result<()> {
    // The border pulses red while enemy fire is landing.
    let color = if session.screen_flash > 0.0 {
        C_BORDER_HIT
    } else {
        C_BORDER
    };
    let (left, top) = cell(vp, Vec2::new(0.0, 0.0));
    let (right, bottom) = cell(vp, PLAYFIELD);
    let inner_w = (right - left - 1).max(0) as usize;

    put(out, left, top, &format!("┌{}┐", "─".repeat(inner_w)), color)?;
    put(out, left, bottom, &format!("└{}┘", "─".repeat(inner_w)), color)?;
    for row in (top + 1)..bottom {
        put(out, left, row, "│", color)?;
        put(out, right, row, "│", color)?;
    }
    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, session: &GameSession, cols: u16) -> std::io::Result<()> {
    let res = &session.resources;

    // Score and best — left
    let score_str = if session.best_score > 0 {
        format!("Score:{:>6}  Best:{:>6}", res.score, session.best_score)
    } else {
        format!("Score:{:>6}", res.score)
    };
    put(out, 1, 0, &score_str, C_HUD_SCORE)?;

    // Wave — centre
    let wave_str = format!("[ WAVE {} ]", session.wave.number);
    put_centered(out, i32::from(cols) / 2, 0, &wave_str, C_HUD_WAVE)?;

    // Ammo and lives — right
    let ammo_pips: String = "●".repeat(res.ammo as usize)
        + &"○".repeat((AMMO_MAX - res.ammo) as usize);
    let ammo_str = match res.reload {
        Some(left) => {
            let filled = ((1.0 - left / RELOAD_SECONDS) * 6.0).clamp(0.0, 6.0) as usize;
            format!("Reload:{}{}", "▮".repeat(filled), "▯".repeat(6 - filled))
        }
        None => format!("Ammo:{ammo_pips}"),
    };
    let hearts: String = "♥".repeat(res.lives as usize);
    let lives_str = format!("  Lives:{hearts}");
    let right_len = (ammo_str.chars().count() + lives_str.chars().count()) as u16;
    let rx = i32::from(cols.saturating_sub(right_len + 1));
    put(out, rx, 0, &ammo_str, C_HUD_AMMO)?;
    put(
        out,
        rx + ammo_str.chars().count() as i32,
        0,
        &lives_str,
        C_HUD_LIVES,
    )?;
    Ok(())
}

// ── Cover slots ───────────────────────────────────────────────────────────────

fn cover_glyph(kind: CoverKind) -> &'static str {
    match kind {
        CoverKind::Barrel => "▓",
        CoverKind::Crate => "▒",
        CoverKind::Rock => "█",
        CoverKind::Sandbags => "░",
    }
}

fn draw_covers<W: Write>(out: &mut W, vp: &Viewport) -> std::io::Result<()> {
    for slot in &COVER_SLOTS {
        let half = Vec2::new(slot.size.x / 2.0, slot.size.y / 2.0);
        let (left, top) = cell(vp, slot.center - half);
        let (right, bottom) = cell(vp, slot.center + half);
        let width = (right - left).max(1) as usize;
        let row_fill = cover_glyph(slot.kind).repeat(width);
        for row in top..=bottom {
            put(out, left, row, &row_fill, C_COVER)?;
        }
    }
    Ok(())
}

// ── Enemies ───────────────────────────────────────────────────────────────────

fn hat(enemy: &Enemy) -> &'static str {
    match enemy.outfit {
        Outfit::Poncho => "▄█▄",
        Outfit::Duster => "▄▀▄",
        Outfit::Vest => "▗█▖",
    }
}

fn draw_enemy<W: Write>(out: &mut W, enemy: &Enemy, vp: &Viewport) -> std::io::Result<()> {
    let slot = &COVER_SLOTS[enemy.slot];
    let cover_top_y = slot.center.y - slot.size.y / 2.0;
    // Wounded enemies read darker
    let body = if enemy.hp < enemy.max_hp {
        Color::DarkGreen
    } else {
        C_ENEMY
    };

    match enemy.phase {
        EnemyPhase::Entering { stride, .. } => {
            let (col, row) = cell(vp, enemy.pos);
            put(out, col - 1, row - 1, hat(enemy), body)?;
            put(out, col - 1, row, if stride { "/ \\" } else { "| |" }, body)?;
        }
        EnemyPhase::Warning { left } => {
            let center = hitbox_center(enemy);
            let (col, row) = cell(vp, center);
            put(out, col - 1, row, hat(enemy), body)?;
            // Pulsing alert above the sliver
            if ((left * 8.0) as i32) % 2 == 0 {
                put(out, col, row - 1, "!", C_ALERT)?;
            }
        }
        EnemyPhase::Peeking { .. } => {
            let center = hitbox_center(enemy);
            let (col, row) = cell(vp, center);
            put(out, col - 1, row - 1, hat(enemy), body)?;
            put(out, col - 1, row, "(•)", body)?;
        }
        EnemyPhase::Shooting { .. } => {
            let center = hitbox_center(enemy);
            let (col, row) = cell(vp, center);
            put(out, col - 1, row - 1, hat(enemy), body)?;
            put(out, col - 1, row, "(•)", body)?;
            put(out, col + 2, row, "✦", C_FLASH)?;
        }
        EnemyPhase::Retreating { left } => {
            // Flicker while flinching
            if ((left * 20.0) as i32) % 2 == 0 {
                let center = hitbox_center(enemy);
                let (col, row) = cell(vp, center);
                put(out, col - 1, row, "(•)", body)?;
            }
        }
        EnemyPhase::Dead { sink } => {
            let progress = 1.0 - (sink / DEATH_SINK_SECONDS).clamp(0.0, 1.0);
            let pos = Vec2::new(slot.center.x, cover_top_y - 20.0 + progress * 24.0);
            let (col, row) = cell(vp, pos);
            put(out, col - 1, row, "(✖)", C_ENEMY_DEAD)?;
        }
        EnemyPhase::Hiding { .. } => {}
    }
    Ok(())
}

fn hitbox_center(enemy: &Enemy) -> Vec2 {
    enemy_hitbox(enemy).map_or(enemy.pos, |r| r.center())
}

// ── Particles ─────────────────────────────────────────────────────────────────

fn draw_particle<W: Write>(out: &mut W, particle: &Particle, vp: &Viewport) -> std::io::Result<()> {
    let (col, row) = cell(vp, particle.pos);
    let (glyph, color) = match particle.kind {
        ParticleKind::MuzzleFlash => ("✶", C_FLASH),
        ParticleKind::Blood => ("∙", C_BLOOD),
        ParticleKind::BulletHole => ("•", C_HOLE),
        ParticleKind::HitFlash => ("✹", Color::White),
        ParticleKind::EnemyFlash => ("✦", C_FLASH),
    };
    put(out, col, row, glyph, color)
}

// ── Reload strip ──────────────────────────────────────────────────────────────

fn draw_reload_strip<W: Write>(
    out: &mut W,
    session: &GameSession,
    vp: &Viewport,
) -> std::io::Result<()> {
    let (col, row) = cell(vp, RELOAD_REGION.center());
    let label = if session.resources.reload.is_some() {
        "· RELOADING ·"
    } else {
        "· RELOAD ·"
    };
    put_centered(out, col, row, label, C_HINT)
}

// ── Wave banner ───────────────────────────────────────────────────────────────

fn draw_banner<W: Write>(
    out: &mut W,
    session: &GameSession,
    vp: &Viewport,
) -> std::io::Result<()> {
    // The terminal has no opacity; approximate the ramp with brightness.
    let alpha = banner_alpha(&session.wave);
    let color = if alpha >= 0.66 {
        Color::White
    } else if alpha >= 0.33 {
        Color::Grey
    } else {
        Color::DarkGrey
    };
    let (col, row) = cell(vp, Vec2::new(PLAYFIELD.x / 2.0, 90.0));
    put_centered(out, col, row, &format!("═══ WAVE {} ═══", session.wave.number), color)
}

// ── Title screen ──────────────────────────────────────────────────────────────

fn draw_title<W: Write>(out: &mut W, session: &GameSession, vp: &Viewport) -> std::io::Result<()> {
    let (cx, title_row) = cell(vp, Vec2::new(PLAYFIELD.x / 2.0, 70.0));
    put_centered(out, cx, title_row, "★  SHOOTING  GALLERY  ★", Color::Cyan)?;
    if session.best_score > 0 {
        put_centered(
            out,
            cx,
            title_row + 2,
            &format!("Best Score: {}", session.best_score),
            C_HUD_SCORE,
        )?;
    }
    draw_button(out, vp, START_BUTTON, "START")?;
    Ok(())
}

// ── Game-over overlay ─────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(
    out: &mut W,
    session: &GameSession,
    vp: &Viewport,
) -> std::io::Result<()> {
    let (cx, row) = cell(vp, Vec2::new(PLAYFIELD.x / 2.0, 80.0));
    put_centered(out, cx, row - 1, "╔════════════════════╗", Color::Red)?;
    put_centered(out, cx, row, "║    GAME  OVER      ║", Color::Red)?;
    put_centered(out, cx, row + 1, "╚════════════════════╝", Color::Red)?;

    let score = session.resources.score;
    put_centered(out, cx, row + 2, &format!("Final Score: {score:>6}"), C_HUD_SCORE)?;
    let best_line = if score >= session.best_score && score > 0 {
        format!("★ NEW BEST: {:>6} ★", session.best_score)
    } else {
        format!("Best Score:  {:>6}", session.best_score)
    };
    put_centered(out, cx, row + 3, &best_line, C_HUD_SCORE)?;

    draw_button(out, vp, RESTART_BUTTON, "RESTART")?;
    Ok(())
}

// ── Buttons ───────────────────────────────────────────────────────────────────

fn draw_button<W: Write>(
    out: &mut W,
    vp: &Viewport,
    rect: Rect,
    label: &str,
) -> std::io::Result<()> {
    let (left, top) = cell(vp, Vec2::new(rect.x, rect.y));
    let (right, bottom) = cell(vp, Vec2::new(rect.x + rect.w, rect.y + rect.h));
    let inner_w = (right - left - 1).max(1) as usize;
    put(out, left, top, &format!("┌{}┐", "─".repeat(inner_w)), Color::White)?;
    put(out, left, bottom, &format!("└{}┘", "─".repeat(inner_w)), Color::White)?;
    for row in (top + 1)..bottom {
        put(out, left, row, "│", Color::White)?;
        put(out, right, row, "│", Color::White)?;
    }
    put_centered(out, (left + right) / 2, (top + bottom) / 2, label, Color::Yellow)?;
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, rows: u16) -> std::io::Result<()> {
    put(
        out,
        1,
        i32::from(rows.saturating_sub(1)),
        "CLICK : Shoot   R / bottom strip : Reload   Q : Quit",
        C_HINT,
    )
}

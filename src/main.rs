//! GRAVITRIS - a falling-block puzzle where the floor won't stay put

mod audio;
mod clear;
mod factory;
mod gravity;
mod grid;
mod input;
mod piece;
mod score;
mod session;
mod settings;
mod ui;

use audio::{AudioManager, Sfx};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use input::{InputAction, KeyMap};
use ratatui::{Terminal, backend::CrosstermBackend};
use session::{GameEvent, GameSession};
use settings::Settings;
use std::{
    io::{self, stdout},
    time::{Duration, Instant},
};

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

fn main() -> io::Result<()> {
    // Log to a per-session file; the terminal belongs to the UI
    let session_id: u32 = rand::random();
    let log_dir = std::env::temp_dir().join("gravitris");
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender =
        tracing_appender::rolling::never(&log_dir, format!("{:08x}.log", session_id));
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gravitris=debug".parse().expect("valid directive")),
        )
        .with_ansi(false)
        .init();
    tracing::info!(
        "gravitris starting up, session={:08x}, logs in {}",
        session_id,
        log_dir.display()
    );

    let mut settings = Settings::load();
    // Audio is optional - the game runs silently without a device
    let mut audio = AudioManager::new(settings.sound_enabled, settings.music_enabled);

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut settings, &mut audio);

    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    if let Err(e) = settings.save() {
        eprintln!("Warning: could not save settings: {}", e);
    }

    match &result {
        Ok((score, level, lines)) => {
            println!("Final score: {}", score);
            println!("Level: {} | Lines: {}", level, lines);
            if *score > 0 && *score >= settings.high_score {
                println!("New high score!");
            }
        }
        Err(e) => eprintln!("Error: {}", e),
    }
    result.map(|_| ())
}

/// Main loop: dispatch input to the session, tick it once per frame, fan
/// events out to audio and persistence, render. Returns the final
/// (score, level, lines) when the player quits.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &mut Settings,
    audio: &mut Option<AudioManager>,
) -> io::Result<(u64, u32, u32)> {
    let keymap = KeyMap::default();
    let start = Instant::now();
    let mut session = GameSession::new(0);
    // Warning indicator stays lit until the shift lands
    let mut gravity_warning = false;

    loop {
        let frame_start = Instant::now();
        let now = start.elapsed().as_millis() as u64;

        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                match keymap.action_for(&key) {
                    Some(InputAction::Quit) => {
                        return Ok((
                            session.score.points,
                            session.score.level,
                            session.score.lines,
                        ));
                    }
                    Some(InputAction::MoveLeft) => session.move_piece(-1),
                    Some(InputAction::MoveRight) => session.move_piece(1),
                    Some(InputAction::Rotate) => session.rotate_piece(),
                    Some(InputAction::SoftDrop) => session.soft_drop(),
                    Some(InputAction::HardDrop) => session.hard_drop(),
                    Some(InputAction::Pause) => session.toggle_pause(now),
                    Some(InputAction::Restart) => {
                        session.restart(now);
                        gravity_warning = false;
                    }
                    Some(InputAction::ToggleSound) => {
                        settings.sound_enabled = !settings.sound_enabled;
                        if let Some(audio) = audio.as_mut() {
                            audio.set_sound_enabled(settings.sound_enabled);
                        }
                    }
                    Some(InputAction::ToggleMusic) => {
                        settings.music_enabled = !settings.music_enabled;
                        if let Some(audio) = audio.as_mut() {
                            audio.set_music_enabled(settings.music_enabled);
                        }
                    }
                    None => {}
                }
            }
        }

        session.tick(now);

        for game_event in session.drain_events() {
            let sfx = match &game_event {
                GameEvent::PieceMoved => Some(Sfx::Move),
                GameEvent::PieceRotated => Some(Sfx::Rotate),
                GameEvent::PieceLocked => Some(Sfx::Lock),
                GameEvent::LinesFlashing { .. } => None,
                GameEvent::LinesCleared { .. } => Some(Sfx::LineClear),
                GameEvent::BombExploded { .. } => Some(Sfx::BombBlast),
                GameEvent::LevelUp { .. } => Some(Sfx::LevelUp),
                GameEvent::GravityShiftWarning => {
                    gravity_warning = true;
                    Some(Sfx::GravityWarning)
                }
                GameEvent::GravityShifted { .. } => {
                    gravity_warning = false;
                    Some(Sfx::GravityShift)
                }
                GameEvent::GameOver { score, .. } => {
                    if settings.record_score(*score) {
                        tracing::info!(score, "new high score");
                        if let Err(e) = settings.save() {
                            tracing::warn!("could not persist high score: {}", e);
                        }
                    }
                    Some(Sfx::GameOver)
                }
            };
            if let (Some(sfx), Some(audio)) = (sfx, audio.as_ref()) {
                audio.play(sfx);
            }
        }

        if let Some(audio) = audio.as_mut() {
            audio.update();
        }

        terminal.draw(|frame| ui::render(frame, &session, settings, gravity_warning))?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }
}

mod fixture;
mod renderer;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use fixture::Fixture;
use ratatui::DefaultTerminal;
use readalong::{HeadlessSurface, Session, SyncConfig, TickOutcome};

const SEEK_STEP_MS: f64 = 10_000.0;

#[derive(clap::Parser)]
#[command(name = "replay", about = "Replay a narrated document in the terminal")]
struct Args {
    #[arg(short, long, default_value_t = Fixture::Parthenon)]
    fixture: Fixture,

    /// Wall-clock milliseconds between ticks.
    #[arg(short, long, default_value_t = 50)]
    speed: u64,

    /// Playback milliseconds advanced per tick.
    #[arg(long, default_value_t = 100)]
    step: u64,

    /// Transcript JSON to use instead of the fixture.
    #[arg(long, requires = "document")]
    transcript: Option<PathBuf>,

    /// Markdown document to use instead of the fixture.
    #[arg(long, requires = "transcript")]
    document: Option<PathBuf>,

    /// Write resolver logs to this file (filter with RUST_LOG).
    #[arg(long, env = "READALONG_LOG")]
    log: Option<PathBuf>,
}

struct App {
    session: Session,
    surface: HeadlessSurface,
    clock_ms: f64,
    duration_ms: f64,
    paused: bool,
    ended: bool,
    speed_ms: u64,
    step_ms: u64,
    last_outcome: Option<TickOutcome>,
    source_name: String,
}

impl App {
    fn new(session: Session, speed_ms: u64, step_ms: u64, source_name: String) -> Self {
        let duration_ms = session
            .segments()
            .segments()
            .iter()
            .map(|s| s.time_end_ms)
            .max()
            .unwrap_or(0) as f64;
        Self {
            session,
            surface: HeadlessSurface::new(),
            clock_ms: 0.0,
            duration_ms,
            paused: false,
            ended: false,
            speed_ms,
            step_ms,
            last_outcome: None,
            source_name,
        }
    }

    fn update(&mut self) {
        let tick = self
            .session
            .on_time_update(self.clock_ms / 1000.0, &mut self.surface);
        if let Some(ticket) = tick.layout {
            self.session.after_layout(ticket, &mut self.surface);
        }
        self.last_outcome = Some(tick.outcome);
    }

    fn seek_to(&mut self, target_ms: f64) {
        self.clock_ms = target_ms.clamp(0.0, self.duration_ms);
        self.ended = false;
        self.update();
    }

    fn advance(&mut self) {
        if self.ended {
            return;
        }
        self.clock_ms += self.step_ms as f64;
        if self.clock_ms > self.duration_ms {
            self.clock_ms = self.duration_ms;
            self.session.on_playback_ended(&mut self.surface);
            self.ended = true;
            self.paused = true;
            return;
        }
        self.update();
    }
}

fn main() {
    use clap::Parser;
    let args = Args::parse();

    if let Some(path) = &args.log {
        let file = File::create(path).expect("log file must be writable");
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "readalong=debug".into()),
            )
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    let (transcript, document, source_name) = match (&args.transcript, &args.document) {
        (Some(transcript), Some(document)) => (
            std::fs::read_to_string(transcript).expect("transcript must be readable"),
            std::fs::read_to_string(document).expect("document must be readable"),
            document.display().to_string(),
        ),
        _ => (
            args.fixture.transcript().to_string(),
            args.fixture.document().to_string(),
            args.fixture.to_string(),
        ),
    };

    let config = SyncConfig::from_env().expect("READALONG_* settings must be valid");
    let mut session = match Session::from_sources(&transcript, &document, config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if args.fixture.aligned() && args.transcript.is_none() {
        let stats = session.realign_offsets();
        tracing::info!(aligned = stats.aligned, cleared = stats.cleared, "fixture_aligned");
    }

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, App::new(session, args.speed, args.step, source_name));
    ratatui::restore();

    match result {
        Ok(app) => {
            println!(
                "Done. {} segments over {} blocks ({}).",
                app.session.segments().len(),
                app.session.blocks().len(),
                app.source_name,
            );
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(terminal: &mut DefaultTerminal, mut app: App) -> std::io::Result<App> {
    app.update();
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| renderer::render(frame, &app))?;

        let tick_duration = Duration::from_millis(app.speed_ms);
        let timeout = tick_duration.saturating_sub(last_tick.elapsed());

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char(' ') => {
                        if app.ended {
                            app.seek_to(0.0);
                        }
                        app.paused = !app.paused;
                        last_tick = Instant::now();
                    }
                    KeyCode::Right => app.seek_to(app.clock_ms + SEEK_STEP_MS),
                    KeyCode::Left => app.seek_to(app.clock_ms - SEEK_STEP_MS),
                    KeyCode::Up => {
                        app.speed_ms = app.speed_ms.saturating_sub(10).max(5);
                    }
                    KeyCode::Down => {
                        app.speed_ms += 10;
                    }
                    KeyCode::Home => app.seek_to(0.0),
                    _ => {}
                }
            }
        } else if !app.paused && last_tick.elapsed() >= tick_duration {
            app.advance();
            last_tick = Instant::now();
        }
    }

    Ok(app)
}

use anyhow::Context;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use maze_chase::actor::Actor;
use maze_chase::{
    Dir, GameConfig, GhostMode, HighScoreStore, JsonHighScores, Layout, MemoryRewards, Phase, Pos,
    RandomSource, SeededRandom, Session, SessionResult, Tile,
};
use std::fs::{self, File};
use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

const CELL_W: usize = 2;
const DEFAULT_TICK_MS: u64 = 16;
const DEFAULT_RENDER_FPS: u64 = 60;
const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);
const DEFAULT_HIGH_SCORE_FILE: &str = "maze-chase-score.json";
const DEFAULT_LOG_FILE: &str = "maze-chase.log";

type Game = Session<MemoryRewards, JsonHighScores>;

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Ghost,
    Scared,
    Eaten,
    Wall,
    Empty,
    Pellet,
    Power,
    Bonus,
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Empty,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let layout = load_layout()?;
    let config = load_config()?;
    let high_score_path = env_path("MAZE_CHASE_HIGH_SCORE").unwrap_or_else(|| DEFAULT_HIGH_SCORE_FILE.into());
    let high_scores = JsonHighScores::open(&high_score_path)
        .with_context(|| format!("opening high score file {}", high_score_path.display()))?;
    let rng: Box<dyn RandomSource> = match read_seed()? {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(SeededRandom::from_entropy()),
    };
    let mut game = Session::init(&layout, config, rng, MemoryRewards::default(), high_scores)
        .context("starting chase session")?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &mut game);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result?;

    let rewards = game.rewards().clone();
    let state = game.teardown();
    println!(
        "score {}  coins +{}  xp +{}",
        state.score, rewards.coins, rewards.xp
    );
    Ok(())
}

fn run(stdout: &mut Stdout, game: &mut Game) -> io::Result<()> {
    let grid_w = game.grid().width();
    let grid_h = game.grid().height();
    let mut renderer = Renderer::new(grid_w, grid_h);
    let mut pending: Option<Dir> = None;
    let mut last_tick = Instant::now();
    let (tick_ms, render_fps) = read_speed_settings();
    let frame_time = Duration::from_micros(1_000_000 / render_fps.max(1));

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Char('k') | KeyCode::Up => pending = Some(Dir::Up),
                        KeyCode::Char('j') | KeyCode::Down => pending = Some(Dir::Down),
                        KeyCode::Char('h') | KeyCode::Left => pending = Some(Dir::Left),
                        KeyCode::Char('l') | KeyCode::Right => pending = Some(Dir::Right),
                        _ => {}
                    },
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= Duration::from_millis(tick_ms) {
            // A stalled terminal should not fast-forward the maze.
            let delta = last_tick.elapsed().min(MAX_FRAME_DELTA);
            last_tick = Instant::now();
            game.update(delta, pending.take());
            render(stdout, game, &mut renderer)?;
            if let Some(result) = game.result().copied() {
                render_result(stdout, game, result)?;
                return Ok(());
            }
        } else {
            render(stdout, game, &mut renderer)?;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn read_speed_settings() -> (u64, u64) {
    let tick_ms = std::env::var("MAZE_CHASE_TICK_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_TICK_MS);
    let render_fps = std::env::var("MAZE_CHASE_FPS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RENDER_FPS);
    (tick_ms, render_fps)
}

fn read_seed() -> anyhow::Result<Option<u64>> {
    match std::env::var("MAZE_CHASE_SEED") {
        Ok(raw) => {
            let seed = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("MAZE_CHASE_SEED is not a number: {raw:?}"))?;
            Ok(Some(seed))
        }
        Err(_) => Ok(None),
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from)
}

fn load_layout() -> anyhow::Result<Layout> {
    let Some(path) = env_path("MAZE_CHASE_LAYOUT") else {
        return Ok(Layout::default_maze()?);
    };
    let text = fs::read_to_string(&path).with_context(|| format!("reading layout {}", path.display()))?;
    let rows: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();
    Layout::parse(&rows).with_context(|| format!("parsing layout {}", path.display()))
}

fn load_config() -> anyhow::Result<GameConfig> {
    let Some(path) = env_path("MAZE_CHASE_CONFIG") else {
        return Ok(GameConfig::default());
    };
    let text = fs::read_to_string(&path).with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Logs only go somewhere when `RUST_LOG` is set; stdout belongs to the game.
fn init_tracing() -> anyhow::Result<()> {
    let Ok(filter) = EnvFilter::try_from_default_env() else {
        return Ok(());
    };
    let path = env_path("MAZE_CHASE_LOG").unwrap_or_else(|| DEFAULT_LOG_FILE.into());
    let file = File::create(&path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

fn render(stdout: &mut Stdout, game: &Game, renderer: &mut Renderer) -> io::Result<()> {
    let width = game.grid().width();
    let height = game.grid().height();
    let needed_h = (height + 2) as u16;
    let needed_w = (width * CELL_W) as u16;

    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }

    let state = game.state();
    let status = match game.phase() {
        Phase::Resetting { .. } => "  READY!",
        _ => "",
    };
    let hud = format!(
        "Score: {}  Best: {}  Lives: {}  Pellets: {}  Power: {:.1}s  (q to quit){}",
        state.score,
        game.high_scores().high_score(),
        state.lives_remaining,
        state.pellets_remaining,
        game.power_remaining().as_secs_f32(),
        status
    );
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    let cells = frame(game);
    for (idx, cell) in cells.into_iter().enumerate() {
        if renderer.needs_full || cell != renderer.last[idx] {
            renderer.last[idx] = cell;
            draw_cell(stdout, renderer, idx % width, idx / width, cell)?;
        }
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

/// Tiles first, then bonus, ghosts and the player on top.
fn frame(game: &Game) -> Vec<Cell> {
    let grid = game.grid();
    let width = grid.width();
    let mut cells = Vec::with_capacity(width * grid.height());
    for y in 0..grid.height() {
        for x in 0..width {
            let tile = grid.tile(Pos::new(x as i32, y as i32)).unwrap_or(Tile::Wall);
            cells.push(tile_cell(tile));
        }
    }

    if let Some(pos) = game.bonus_cell() {
        cells[pos.y as usize * width + pos.x as usize] = Cell {
            glyph: Glyph::Bonus,
            color: Color::Green,
        };
    }
    for ghost in game.ghosts() {
        let cell = match ghost.mode {
            GhostMode::Scared => Cell {
                glyph: Glyph::Scared,
                color: Color::Blue,
            },
            GhostMode::Eaten => Cell {
                glyph: Glyph::Eaten,
                color: Color::White,
            },
            GhostMode::Patrol | GhostMode::Pursue => Cell {
                glyph: Glyph::Ghost,
                color: Color::Red,
            },
        };
        cells[screen_index(&ghost.actor, game)] = cell;
    }
    cells[screen_index(game.player(), game)] = Cell {
        glyph: Glyph::Player,
        color: Color::Yellow,
    };
    cells
}

/// Nearest cell to the actor's continuous position, folded back onto the
/// grid while it is halfway through the tunnel.
fn screen_index(actor: &Actor, game: &Game) -> usize {
    let width = game.grid().width() as i32;
    let height = game.grid().height() as i32;
    let (x, y) = actor.position();
    let x = (x.round() as i32).rem_euclid(width);
    let y = (y.round() as i32).clamp(0, height - 1);
    (y * width + x) as usize
}

fn tile_cell(tile: Tile) -> Cell {
    match tile {
        Tile::Wall => Cell {
            glyph: Glyph::Wall,
            color: Color::Blue,
        },
        Tile::Path => Cell {
            glyph: Glyph::Empty,
            color: Color::Reset,
        },
        Tile::Pellet => Cell {
            glyph: Glyph::Pellet,
            color: Color::White,
        },
        Tile::PowerPellet => Cell {
            glyph: Glyph::Power,
            color: Color::Magenta,
        },
    }
}

fn draw_cell(stdout: &mut Stdout, renderer: &Renderer, x: usize, y: usize, cell: Cell) -> io::Result<()> {
    let (text, color) = match cell.glyph {
        Glyph::Player => ("😃", cell.color),
        Glyph::Ghost => ("👻", cell.color),
        Glyph::Scared => ("😱", cell.color),
        Glyph::Eaten => ("👀", cell.color),
        Glyph::Wall => ("██", cell.color),
        Glyph::Empty => ("  ", cell.color),
        Glyph::Pellet => ("· ", cell.color),
        Glyph::Power => ("● ", cell.color),
        Glyph::Bonus => ("🍒", cell.color),
    };
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

fn render_result(stdout: &mut Stdout, game: &Game, result: SessionResult) -> io::Result<()> {
    let width = game.grid().width();
    let height = game.grid().height();
    let (term_w, term_h) = terminal::size()?;
    let needed_h = (height + 2) as u16;
    let needed_w = (width * CELL_W) as u16;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(MoveTo(0, needed_h))?;
    } else {
        let origin_x = (term_w - needed_w) / 2;
        let origin_y = (term_h - needed_h) / 2 + 1;
        stdout.queue(MoveTo(origin_x, origin_y + height as u16))?;
    }
    let headline = if result.won { "MAZE CLEARED" } else { "GAME OVER" };
    let record = if result.is_new_high_score { "  NEW HIGH SCORE!" } else { "" };
    stdout.queue(Print(format!(
        "{} - Final Score: {}{}  +{} coins +{} xp (press q to quit)",
        headline, result.final_score, record, result.reward.coins, result.reward.xp
    )))?;
    stdout.flush()?;
    loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                    return Ok(());
                }
            }
        }
    }
}

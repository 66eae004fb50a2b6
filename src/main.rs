use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use term_views::backend::BufferContext;
use term_views::geometry::{Point, Rect};
use term_views::mines::field::CELL_WIDTH;
use term_views::mines::{FieldView, Model, SplitMix64};
use term_views::theme::Theme;
use term_views::tracing_sub;
use term_views::view::{Autosizing, ControlListener, SharedView, View};
use term_views::views::{Label, TextButton};
use term_views::window::Window;

#[derive(Parser, Debug)]
#[command(name = "mines", about = "Minesweeper on a retained terminal view hierarchy.")]
struct Args {
    /// Board rows.
    #[arg(long, default_value_t = 9)]
    rows: u32,
    /// Board columns.
    #[arg(long, default_value_t = 9)]
    cols: u32,
    /// Number of mines.
    #[arg(long, default_value_t = 10)]
    mines: u32,
    /// Board layout seed; derived from the clock when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

const TAG_NEW_GAME: i32 = 1;
const TIME_CAP_SECS: u64 = 999;

/// Listener on the "new" button; the run loop picks the flag up after
/// dispatch.
struct RestartRequest {
    requested: bool,
}

impl ControlListener for RestartRequest {
    fn value_changed(&mut self, tag: i32, value: f32) {
        if tag == TAG_NEW_GAME && value > 0.5 {
            self.requested = true;
        }
    }
}

fn main() -> io::Result<()> {
    tracing_sub::init_default();
    let args = Args::parse();

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    terminal::enable_raw_mode()?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &args);

    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos() as u64
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, args: &Args) -> io::Result<()> {
    let mut rng = SplitMix64::new(args.seed.unwrap_or_else(clock_seed));
    let model = Model::new(args.rows, args.cols, args.mines, &mut rng)
        .map_err(io::Error::other)?;
    let model = Rc::new(RefCell::new(model));

    let size = terminal.size()?;
    let window_rect = Rect::new(0, 0, size.width as i32, size.height as i32);
    let window = Window::new(window_rect, Theme::default());

    let status = Rc::new(RefCell::new(Label::new(
        Rect::new(1, 0, window_rect.right - 12, 1),
        "",
    )));
    status.borrow_mut().set_autosizing(Autosizing::RIGHT);
    let status_view: SharedView = status.clone();

    let mut new_button = TextButton::new(
        Rect::new(window_rect.right - 11, 0, window_rect.right - 1, 1),
        "new",
        TAG_NEW_GAME,
    );
    let restart = Rc::new(RefCell::new(RestartRequest { requested: false }));
    new_button.set_listener(Some(restart.clone()));
    new_button.set_autosizing(Autosizing::LEFT | Autosizing::RIGHT);
    let button_view: SharedView = Rc::new(RefCell::new(new_button));

    let field_origin = board_origin(window_rect, args);
    let field = Rc::new(RefCell::new(FieldView::new(field_origin, model.clone())));
    let field_view: SharedView = field.clone();

    {
        let root = window.root();
        let mut root = root.borrow_mut();
        root.set_background_color(window.theme().background);
        root.add_view(&status_view);
        root.add_view(&button_view);
        root.add_view(&field_view);
    }

    let mut started = Instant::now();
    let mut finished: Option<Instant> = None;

    loop {
        {
            let m = model.borrow();
            if finished.is_none() && (m.is_trapped() || m.is_done()) {
                finished = Some(Instant::now());
            }
            let elapsed = finished.unwrap_or_else(Instant::now) - started;
            let secs = elapsed.as_secs().min(TIME_CAP_SECS);
            let state = if m.is_trapped() {
                "  BOOM  n:new q:quit"
            } else if m.is_done() {
                "  CLEAR n:new q:quit"
            } else {
                ""
            };
            status.borrow_mut().set_text(format!(
                "mines {:>3}  flags {:>3}  time {:>3}{}",
                m.mines(),
                m.flags(),
                secs,
                state
            ));
        }

        window.invalidate_dirty_views();
        if !window.take_invalid_rects().is_empty() {
            terminal.draw(|frame| {
                let buf = frame.buffer_mut();
                let mut ctx = BufferContext::new(buf);
                window.draw_rect(&mut ctx, window.size());
            })?;
        }

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let ev = event::read()?;
        let mut restart_now = false;
        match &ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('n') => restart_now = true,
                _ => {
                    window.handle_event(&ev);
                }
            },
            _ => {
                window.handle_event(&ev);
            }
        }
        if restart.borrow().requested {
            restart.borrow_mut().requested = false;
            restart_now = true;
        }
        if restart_now {
            if let Ok(next) = Model::new(args.rows, args.cols, args.mines, &mut rng) {
                *model.borrow_mut() = next;
                started = Instant::now();
                finished = None;
                field.borrow_mut().set_dirty(true);
            }
        }
    }
}

fn board_origin(window_rect: Rect, args: &Args) -> Point {
    let board_width = args.cols as i32 * CELL_WIDTH;
    let board_height = args.rows as i32;
    let x = ((window_rect.width() - board_width) / 2).max(0);
    let y = (((window_rect.height() - 1) - board_height) / 2 + 1).max(1);
    Point::new(x, y)
}

use crate::command::{self, Command, HELP};
use annotate::{
    addr_space::{Location, Region},
    asm_view::{AsmView, EditTarget},
    cache::Lru,
    config::Config,
    data_view::DataView,
    memory_store::MemoryStore,
    resolve::Rendered,
    script_view::ScriptView,
    store::{Reconnecting, SegmentKind, Store},
    wram_view::WramView,
};
use std::{
    io::{BufRead, IsTerminal, Write},
    path::PathBuf,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewKind {
    Asm,
    Script,
    Wram,
}

pub struct App {
    store: Reconnecting<MemoryStore>,
    cache: Lru<Location, Rendered>,
    config: Config,
    project_path: PathBuf,
    view: ViewKind,
    asm: AsmView,
    script: ScriptView,
    wram: WramView,
    data: DataView,
    color: bool,
}

fn fail(err: impl core::fmt::Display) -> String {
    err.to_string()
}

impl App {
    pub fn new(args: &crate::Args) -> annotate::Result<Self> {
        let config = match &args.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        let mut store = Reconnecting::new(MemoryStore::load(&args.project)?);
        let source = match args.source {
            Some(source) => source,
            None => store
                .sources(SegmentKind::Asm)?
                .first()
                .copied()
                .unwrap_or(Location::rom(0)),
        };
        log::info!("opened {} at {source}", args.project.display());
        Ok(Self {
            cache: Lru::new(config.cache_capacity),
            project_path: args.project.clone(),
            view: args.view,
            asm: AsmView::new(source, config.page_size),
            script: ScriptView::new(config.page_size),
            wram: WramView::new(&config),
            data: DataView::new(source, config.page_size),
            color: std::io::stdout().is_terminal(),
            store,
            config,
        })
    }

    pub fn run(args: crate::Args) -> annotate::Result<()> {
        let mut app = Self::new(&args)?;
        if args.dump {
            app.color = false;
            if let Err(err) = app.show() {
                log::error!("{err}");
            }
            return Ok(());
        }
        app.repl();
        Ok(())
    }

    fn repl(&mut self) {
        let shown = self.show();
        self.report(shown);
        let stdin = std::io::stdin();
        let mut input = String::new();
        loop {
            print!("> ");
            let _ = std::io::stdout().flush();
            input.clear();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    log::error!("failed to read input: {err}");
                    break;
                }
            }
            if input.trim().is_empty() {
                continue;
            }
            match command::parse(&input).and_then(|cmd| self.execute(cmd)) {
                Ok(true) => break,
                Ok(false) => {}
                Err(err) => self.report(Err(err)),
            }
        }
    }

    fn report(&self, result: Result<(), String>) {
        if let Err(err) = result {
            if self.color {
                println!("\x1b[1;31merror:\x1b[m {err}");
            } else {
                println!("error: {err}");
            }
        }
    }

    fn location(&self, text: &str, region: Region) -> Result<Location, String> {
        command::parse_location(text, region).ok_or_else(|| format!("bad address `{text}`"))
    }

    /// Runs one command. Returns whether the viewer should quit.
    fn execute(&mut self, cmd: Command) -> Result<bool, String> {
        let source = self.asm.source();
        match cmd {
            Command::NextPage => {
                self.current_window().scroll_pages(1);
            }
            Command::PrevPage => {
                self.current_window().scroll_pages(-1);
            }
            Command::WheelDown => {
                self.current_window().scroll_wheel(1);
            }
            Command::WheelUp => {
                self.current_window().scroll_wheel(-1);
            }
            Command::Goto(text) => match self.view {
                ViewKind::Asm => {
                    let at = self.location(&text, source.region)?;
                    self.asm.jump(&mut self.store, at).map_err(fail)?;
                }
                ViewKind::Script => {
                    let first = command::parse_item(&text).ok_or_else(|| fail("bad item"))?;
                    self.script.jump(first);
                }
                ViewKind::Wram => {
                    let first = command::parse_item(&text).ok_or_else(|| fail("bad address"))?;
                    self.wram.jump(first);
                }
            },
            Command::Undo => {
                if !self.asm.undo(&mut self.store).map_err(fail)? {
                    return Err("nothing to undo".into());
                }
                self.data.set_source(self.asm.source());
            }
            Command::Redo => {
                if !self.asm.redo(&mut self.store).map_err(fail)? {
                    return Err("nothing to redo".into());
                }
                self.data.set_source(self.asm.source());
            }
            Command::Comment(addr, text) => {
                let at = self.location(&addr, source.region)?;
                self.edit(at, EditTarget::Comment, &text)?;
            }
            Command::Rename(addr, name) => {
                let at = self.location(&addr, source.region)?;
                self.edit(at, EditTarget::FunctionName, &name)?;
            }
            Command::Io(addr) => {
                let at = self.location(&addr, source.region)?;
                self.data.set_source(source);
                self.data.set_address(at);
                return self.show_data().map(|()| false);
            }
            Command::DataComment(cell, text) => {
                if self.data.address().is_none() {
                    return Err("run `io ADDR` first".into());
                }
                let cell = self.location(&cell, Region::Wram)?;
                self.data
                    .commit_comment(&mut self.store, &mut self.cache, cell, &text)
                    .map_err(fail)?;
                self.wram.refresh();
                return self.show_data().map(|()| false);
            }
            Command::Find(term) => {
                let functions = self.store.functions(source).map_err(fail)?;
                let found = crate::search::find_functions(&functions, &term);
                let Some(best) = found.first() else {
                    return Err(format!("no function matches `{term}`"));
                };
                for function in found.iter().skip(1).take(10) {
                    println!("  also {} {}", function.start, function.name);
                }
                self.asm.jump(&mut self.store, best.start).map_err(fail)?;
                self.view = ViewKind::Asm;
            }
            Command::Source(at) => {
                self.asm.set_source(at);
                self.data.set_source(at);
                self.view = ViewKind::Asm;
            }
            Command::View(kind) => self.view = kind,
            Command::Sources => {
                for kind in [SegmentKind::Asm, SegmentKind::Script] {
                    for at in self.store.sources(kind).map_err(fail)? {
                        println!("{kind:?} {at}");
                    }
                }
                return Ok(false);
            }
            Command::Refresh => {
                self.asm.refresh(&mut self.cache);
                self.wram.refresh();
                self.script.mark_dirty();
            }
            Command::Write => {
                self.store
                    .get_ref()
                    .project()
                    .save(&self.project_path)
                    .map_err(fail)?;
                println!("saved {}", self.project_path.display());
                return Ok(false);
            }
            Command::Help => {
                println!("{HELP}");
                return Ok(false);
            }
            Command::Quit => return Ok(true),
        }
        self.show().map(|()| false)
    }

    fn edit(&mut self, at: Location, target: EditTarget, text: &str) -> Result<(), String> {
        self.asm
            .begin_edit(&mut self.store, &mut self.cache, at, target)
            .map_err(fail)?;
        if let Err(err) = self.asm.commit_edit(&mut self.store, &mut self.cache, text) {
            self.asm.cancel_edit(&mut self.cache);
            return Err(fail(err));
        }
        self.wram.refresh();
        Ok(())
    }

    fn current_window(&mut self) -> &mut annotate::window::Window {
        match self.view {
            ViewKind::Asm => self.asm.window_mut(),
            ViewKind::Script => self.script.window_mut(),
            ViewKind::Wram => self.wram.window_mut(),
        }
    }

    fn show(&mut self) -> Result<(), String> {
        let (title, page) = match self.view {
            ViewKind::Asm => {
                let page = self
                    .asm
                    .render(&mut self.store, &mut self.cache, &self.config)
                    .map_err(fail)?;
                (self.asm.source().to_string(), page)
            }
            ViewKind::Script => {
                let page = self.script.render(&mut self.store, &self.config).map_err(fail)?;
                let title = match self.script.source() {
                    Some(source) => format!("script {source}"),
                    None => "script".to_string(),
                };
                (title, page)
            }
            ViewKind::Wram => {
                let page = self.wram.render(&mut self.store, &self.config).map_err(fail)?;
                ("wram".to_string(), page)
            }
        };
        print!("{}", crate::render::page(&title, &page, self.color));
        Ok(())
    }

    fn show_data(&mut self) -> Result<(), String> {
        let page = self.data.render(&mut self.store, &self.config).map_err(fail)?;
        let title = match self.data.address() {
            Some(at) => format!("io {at}"),
            None => "io".to_string(),
        };
        print!("{}", crate::render::page(&title, &page, self.color));
        Ok(())
    }
}

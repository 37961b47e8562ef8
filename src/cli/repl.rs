//!
//! content-suite shell
//! -------------------
//! Line-oriented front end. Each input line parses into a `Command`, the sync
//! loop gathers any interactive fields, then the command runs against the
//! active page on the tokio runtime. Navigation follows page redirects until
//! a page settles.

use std::path::PathBuf;

use anyhow::Result;
use base64::Engine;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::{AppError, AppResult};
use crate::model::{ImageUpload, NewBrandManual, NewContenido, TipoContenido};
use crate::pages::{AdminPage, AprobadorAPage, AprobadorBPage, CreadorPage, Landing, LoginPage, Page};
use crate::routes::Route;
use crate::views;

const MAX_REDIRECTS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { email: String, password: Option<String> },
    Logout,
    Whoami,
    Dashboard,
    Open(Route),
    List,
    Select(String),
    Approve(Option<String>),
    Reject { id: String, reason: String },
    NewManual(NewBrandManual),
    NewContent { manual_id: String, tipo: Option<TipoContenido>, titulo: String },
    DeleteManual(String),
    Image(PathBuf),
    Analyze,
    Expand(String),
    SaveImage { audit_id: String, path: PathBuf },
    Stats,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();
        let one = |usage: &str| -> Result<String, String> {
            args.first().map(|s| s.to_string()).ok_or_else(|| format!("usage: {}", usage))
        };
        match head.to_ascii_lowercase().as_str() {
            "login" => {
                let email = one("login <email> [password]")?;
                Ok(Command::Login { email, password: args.get(1).map(|s| s.to_string()) })
            }
            "logout" => Ok(Command::Logout),
            "whoami" => Ok(Command::Whoami),
            "dashboard" => Ok(Command::Dashboard),
            "open" => {
                let target = one("open <creador|aprobador-a|aprobador-b|admin>")?;
                Route::parse(&target).map(Command::Open).ok_or_else(|| format!("unknown page '{}'", target))
            }
            "list" | "ls" => Ok(Command::List),
            "select" => Ok(Command::Select(one("select <id>")?)),
            "approve" => Ok(Command::Approve(args.first().map(|s| s.to_string()))),
            "reject" => {
                let id = one("reject <id> <reason...>")?;
                let reason = rest[id.len()..].trim().to_string();
                Ok(Command::Reject { id, reason })
            }
            "new-manual" => Ok(Command::NewManual(NewBrandManual::default())),
            "new-content" => {
                let tipo = match args.get(1) {
                    Some(t) => Some(t.parse::<TipoContenido>()?),
                    None => None,
                };
                let titulo = args.iter().skip(2).copied().collect::<Vec<_>>().join(" ");
                Ok(Command::NewContent { manual_id: args.first().map(|s| s.to_string()).unwrap_or_default(), tipo, titulo })
            }
            "delete-manual" => Ok(Command::DeleteManual(one("delete-manual <id>")?)),
            "image" => {
                if rest.is_empty() {
                    return Err("usage: image <path>".to_string());
                }
                Ok(Command::Image(PathBuf::from(rest)))
            }
            "analyze" => Ok(Command::Analyze),
            "expand" => Ok(Command::Expand(one("expand <audit_id>")?)),
            "save-image" => {
                if args.len() < 2 {
                    return Err("usage: save-image <audit_id> <path>".to_string());
                }
                Ok(Command::SaveImage { audit_id: args[0].to_string(), path: PathBuf::from(args[1]) })
            }
            "stats" => Ok(Command::Stats),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command '{}'; type 'help'", other)),
        }
    }
}

pub enum ActivePage {
    Login(LoginPage),
    Landing(Page<Landing>),
    Creador(CreadorPage),
    AprobadorA(AprobadorAPage),
    AprobadorB(AprobadorBPage),
    Admin(AdminPage),
}

impl ActivePage {
    fn route(&self) -> Route {
        match self {
            ActivePage::Login(_) => Route::Login,
            ActivePage::Landing(_) => Route::Dashboard,
            ActivePage::Creador(_) => Route::Creador,
            ActivePage::AprobadorA(_) => Route::AprobadorA,
            ActivePage::AprobadorB(_) => Route::AprobadorB,
            ActivePage::Admin(_) => Route::Admin,
        }
    }

    /// Navigation a page asked for after its last action (e.g. a 401).
    fn pending_redirect(&self) -> Option<Route> {
        match self {
            ActivePage::Login(_) => None,
            ActivePage::Landing(p) => p.redirect(),
            ActivePage::Creador(p) => p.page().redirect(),
            ActivePage::AprobadorA(p) => p.page().redirect(),
            ActivePage::AprobadorB(p) => p.page().redirect(),
            ActivePage::Admin(p) => p.page().redirect(),
        }
    }
}

/// REPL state: the API client and the currently mounted page.
pub struct Shell {
    api: ApiClient,
    active: ActivePage,
}

impl Shell {
    pub fn new(api: ApiClient) -> Self {
        let active = ActivePage::Login(LoginPage::new(api.clone()));
        Self { api, active }
    }

    pub fn route(&self) -> Route { self.active.route() }
    pub fn active(&self) -> &ActivePage { &self.active }

    /// Mount the page for `route`, following redirects until one settles.
    pub async fn navigate(&mut self, mut route: Route) -> Route {
        for _ in 0..MAX_REDIRECTS {
            debug!(target: "page", "navigate {}", route);
            let next = match route {
                Route::Login => {
                    let p = LoginPage::new(self.api.clone());
                    let next = p.mount();
                    self.active = ActivePage::Login(p);
                    next
                }
                Route::Dashboard => {
                    let mut p: Page<Landing> = Page::new(self.api.clone());
                    let next = p.mount().await;
                    self.active = ActivePage::Landing(p);
                    next
                }
                Route::Creador => {
                    let mut p = CreadorPage::new(self.api.clone());
                    let next = p.mount().await;
                    self.active = ActivePage::Creador(p);
                    next
                }
                Route::AprobadorA => {
                    let mut p = AprobadorAPage::new(self.api.clone());
                    let next = p.mount().await;
                    self.active = ActivePage::AprobadorA(p);
                    next
                }
                Route::AprobadorB => {
                    let mut p = AprobadorBPage::new(self.api.clone());
                    let next = p.mount().await;
                    self.active = ActivePage::AprobadorB(p);
                    next
                }
                Route::Admin => {
                    let mut p = AdminPage::new(self.api.clone());
                    let next = p.mount().await;
                    self.active = ActivePage::Admin(p);
                    next
                }
            };
            match next {
                Some(r) if r != route => route = r,
                _ => break,
            }
        }
        self.route()
    }

    /// Run one command; the returned text is what the terminal shows.
    pub async fn execute(&mut self, cmd: Command) -> AppResult<String> {
        let out = self.dispatch(cmd).await;
        if let Some(r) = self.active.pending_redirect() {
            if r != self.route() {
                self.navigate(r).await;
            }
        }
        out
    }

    async fn dispatch(&mut self, cmd: Command) -> AppResult<String> {
        let at = self.route();
        match cmd {
            Command::Help => Ok(help_text().to_string()),
            Command::Quit => Ok(String::new()),
            Command::Login { email, password } => {
                let mut login = LoginPage::new(self.api.clone());
                let (user, next) = login.submit(&email, password.as_deref().unwrap_or("")).await?;
                let at = self.navigate(next).await;
                Ok(format!("Bienvenido, {} ({})\n{}", user.nombre, user.role.label(), self.render_for(at)))
            }
            Command::Logout => {
                self.logout();
                self.navigate(Route::Login).await;
                Ok("Sesión cerrada".to_string())
            }
            Command::Whoami => match self.current_user_line() {
                Some(s) => Ok(s),
                None => Ok("No ha iniciado sesión".to_string()),
            },
            Command::Dashboard => {
                let at = self.navigate(Route::Dashboard).await;
                Ok(self.render_for(at))
            }
            Command::Open(route) => {
                let at = self.navigate(route).await;
                if at != route {
                    return Ok(format!("Sin acceso a {}; redirigido a {}\n{}", route, at, self.render()));
                }
                Ok(self.render())
            }
            Command::List => Ok(self.render()),
            Command::Select(id) => self.select(&id),
            Command::Approve(id) => {
                let ActivePage::AprobadorA(p) = &mut self.active else { return Err(wrong_page("approve", at)) };
                let id = match id.or_else(|| p.selected().map(|c| c.id.clone())) {
                    Some(id) => id,
                    None => return Err(AppError::validation("no_selection", "Seleccione un contenido")),
                };
                let res = p.approve(&id).await;
                page_result(res, p.page().error(), p.page().success())
            }
            Command::Reject { id, reason } => {
                let ActivePage::AprobadorA(p) = &mut self.active else { return Err(wrong_page("reject", at)) };
                p.set_reject_reason(&reason);
                let res = p.reject(&id).await;
                page_result(res, p.page().error(), p.page().success())
            }
            Command::NewManual(fields) => {
                let ActivePage::Creador(p) = &mut self.active else { return Err(wrong_page("new-manual", at)) };
                let res = p.create_manual(fields).await;
                page_result(res, p.page().error(), p.page().success())
            }
            Command::NewContent { manual_id, tipo, titulo } => {
                let ActivePage::Creador(p) = &mut self.active else { return Err(wrong_page("new-content", at)) };
                let Some(tipo) = tipo else {
                    return Err(AppError::validation("missing_field", "Seleccione un tipo de contenido"));
                };
                let res = p.create_contenido(NewContenido { brand_manual_id: manual_id, tipo, titulo }).await;
                page_result(res, p.page().error(), p.page().success())
            }
            Command::DeleteManual(id) => {
                let ActivePage::Admin(p) = &mut self.active else { return Err(wrong_page("delete-manual", at)) };
                let res = p.delete_manual(&id).await;
                page_result(res, p.page().error(), p.page().success())
            }
            Command::Image(path) => {
                let ActivePage::AprobadorB(p) = &mut self.active else { return Err(wrong_page("image", at)) };
                let upload = ImageUpload::from_path(&path)?;
                let msg = format!("Imagen seleccionada: {} ({} bytes, {})", upload.file_name, upload.bytes.len(), upload.mime);
                p.choose_image(upload);
                Ok(msg)
            }
            Command::Analyze => {
                let ActivePage::AprobadorB(p) = &mut self.active else { return Err(wrong_page("analyze", at)) };
                match p.analyze().await {
                    Ok(r) => Ok(format!("{}\n{}", p.page().success().unwrap_or_default(), views::analysis_summary(&r))),
                    Err(e) => Err(surface(e, p.page().error())),
                }
            }
            Command::Expand(id) => {
                let ActivePage::AprobadorB(p) = &mut self.active else { return Err(wrong_page("expand", at)) };
                p.toggle_audit(&id).await;
                Ok(views::audit_list(p.auditorias(), p.aprobados(), &p.expanded_set(), p.images()))
            }
            Command::SaveImage { audit_id, path } => {
                let ActivePage::AprobadorB(p) = &mut self.active else { return Err(wrong_page("save-image", at)) };
                let Some(url) = p.ensure_image(&audit_id).await else {
                    return Err(AppError::not_found("image_unavailable".to_string(), format!("no se pudo cargar la imagen de {}", audit_id)));
                };
                let bytes = decode_data_url(url)?;
                std::fs::write(&path, &bytes)?;
                Ok(format!("{} bytes escritos en {}", bytes.len(), path.display()))
            }
            Command::Stats => match &self.active {
                ActivePage::AprobadorA(p) => {
                    let s = p.stats();
                    Ok(views::stats_cards(&[("pendientes", s.pendientes), ("aprobados", s.aprobados), ("rechazados", s.rechazados)]))
                }
                ActivePage::Admin(p) => Ok(admin_cards(p)),
                _ => Err(wrong_page("stats", at)),
            },
        }
    }

    fn select(&mut self, id: &str) -> AppResult<String> {
        let at = self.route();
        let found = match &mut self.active {
            ActivePage::AprobadorA(p) => p.select(id).then(|| p.selected().map(views::content_detail)).flatten(),
            ActivePage::AprobadorB(p) => p.select_content(id).then(|| p.selected_content().map(views::content_detail)).flatten(),
            _ => return Err(wrong_page("select", at)),
        };
        found.ok_or_else(|| AppError::not_found("not_selectable".to_string(), format!("'{}' no está disponible para seleccionar", id)))
    }

    fn logout(&mut self) {
        match &mut self.active {
            ActivePage::Login(_) => self.api.session().clear(),
            ActivePage::Landing(p) => { p.logout(); }
            ActivePage::Creador(p) => { p.page_mut().logout(); }
            ActivePage::AprobadorA(p) => { p.page_mut().logout(); }
            ActivePage::AprobadorB(p) => { p.page_mut().logout(); }
            ActivePage::Admin(p) => { p.page_mut().logout(); }
        }
    }

    fn current_user_line(&self) -> Option<String> {
        let user = match &self.active {
            ActivePage::Login(_) => None,
            ActivePage::Landing(p) => p.user(),
            ActivePage::Creador(p) => p.page().user(),
            ActivePage::AprobadorA(p) => p.page().user(),
            ActivePage::AprobadorB(p) => p.page().user(),
            ActivePage::Admin(p) => p.page().user(),
        }?;
        Some(format!("{} <{}> {}", user.nombre, user.email, user.role.label()))
    }

    fn render_for(&self, at: Route) -> String {
        if at == Route::Login {
            return "Inicie sesión con: login <email> [password]".to_string();
        }
        self.render()
    }

    /// Full text of the active page.
    pub fn render(&self) -> String {
        match &self.active {
            ActivePage::Login(p) => {
                let mut s = "Inicie sesión con: login <email> [password]".to_string();
                if let Some(e) = p.error() {
                    s.push_str(&format!("\nerror: {}", e));
                }
                s
            }
            ActivePage::Landing(p) => match (p.user(), p.role_label(), p.home()) {
                (Some(u), Some(label), Some(home)) => format!(
                    "{}\nBienvenido, {}\nHa iniciado sesión como {}\nIr a su panel: open {}",
                    p.title(),
                    u.nombre,
                    label,
                    home.path()
                ),
                _ => p.title().to_string(),
            },
            ActivePage::Creador(p) => format!(
                "{}\n\nManuales de marca\n{}\n\nContenidos\n{}",
                p.page().title(),
                views::manual_list(p.manuals(), "No hay manuales de marca"),
                views::content_list(p.contenidos(), None, "No hay contenidos generados")
            ),
            ActivePage::AprobadorA(p) => {
                let s = p.stats();
                let pending: Vec<_> = p.pending().into_iter().cloned().collect();
                let mut out = format!(
                    "{}\n{}\n\nPendientes de aprobación\n{}",
                    p.page().title(),
                    views::stats_cards(&[("pendientes", s.pendientes), ("aprobados", s.aprobados), ("rechazados", s.rechazados)]),
                    views::content_list(&pending, p.selected().map(|c| c.id.as_str()), "No hay contenidos pendientes")
                );
                if let Some(c) = p.selected() {
                    out.push_str("\n\n");
                    out.push_str(&views::content_detail(c));
                }
                out
            }
            ActivePage::AprobadorB(p) => {
                let mut out = format!(
                    "{}\n\nContenidos aprobados\n{}",
                    p.page().title(),
                    views::content_list(p.aprobados(), p.selected_content().map(|c| c.id.as_str()), "No hay contenidos aprobados")
                );
                if let Some(img) = p.selected_image() {
                    out.push_str(&format!("\nImagen: {}", img.file_name));
                }
                if let Some(r) = p.analysis() {
                    out.push_str("\n\n");
                    out.push_str(&views::analysis_summary(r));
                }
                out.push_str("\n\nAuditorías\n");
                out.push_str(&views::audit_list(p.auditorias(), p.aprobados(), &p.expanded_set(), p.images()));
                out
            }
            ActivePage::Admin(p) => format!(
                "{}\n{}\n\nManuales de marca\n{}\n\nContenidos\n{}\n\nAuditorías\n{}",
                p.page().title(),
                admin_cards(p),
                views::manual_list(&p.data().manuals, "No hay manuales de marca"),
                views::content_list(&p.data().contenidos, None, "No hay contenidos"),
                views::audit_list(&p.data().auditorias, &p.data().contenidos, &Default::default(), &Default::default())
            ),
        }
    }
}

fn admin_cards(p: &AdminPage) -> String {
    let s = p.stats();
    views::stats_cards(&[
        ("manuales", s.total_manuals),
        ("contenidos", s.total_contenidos),
        ("pendientes", s.pendientes),
        ("aprobados", s.aprobados),
        ("rechazados", s.rechazados),
        ("auditorías", s.auditorias),
    ])
}

fn wrong_page(cmd: &str, at: Route) -> AppError {
    AppError::validation("wrong_page".to_string(), format!("'{}' no está disponible en {}", cmd, at))
}

/// Prefer the message the page recorded over the raw error text.
fn surface(e: AppError, page_error: Option<&str>) -> AppError {
    match page_error {
        Some(msg) if msg != e.message() => AppError::validation(e.code_str().to_string(), msg.to_string()),
        _ => e,
    }
}

fn page_result<T>(res: AppResult<T>, page_error: Option<&str>, page_success: Option<&str>) -> AppResult<String> {
    match res {
        Ok(_) => Ok(page_success.unwrap_or("ok").to_string()),
        Err(e) => Err(surface(e, page_error)),
    }
}

/// Payload bytes of a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> AppResult<Vec<u8>> {
    let (meta, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| AppError::validation("bad_data_url", "la imagen no es un data URL"))?;
    if !meta.ends_with(";base64") {
        return Err(AppError::validation("bad_data_url", "la imagen no está codificada en base64"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::validation("bad_data_url".to_string(), format!("base64 inválido: {}", e)))
}

pub fn help_text() -> &'static str {
    "Commands:
  login <email> [password]         sign in (password prompted when omitted)
  logout                           end the session
  whoami                           show the signed-in user
  dashboard                        go to your role's dashboard
  open <page>                      creador | aprobador-a | aprobador-b | admin
  list                             redraw the current page
  select <id>                      select content (aprobador-a, aprobador-b)
  approve [id]                     approve content (defaults to selection)
  reject <id> <reason...>          reject content with a reason
  new-manual                       create a brand manual (prompts for fields)
  new-content [manual tipo titulo] generate content against a manual
  delete-manual <id>               delete a brand manual (admin)
  image <path>                     choose an image for the visual audit
  analyze                          audit the selected content and image
  expand <audit_id>                expand/collapse an audit record
  save-image <audit_id> <path>     write an audited image to disk
  stats                            show counters
  help                             show this help
  quit | exit                      leave"
}

fn ask(rl: &mut DefaultEditor, label: &str) -> Result<String> {
    Ok(rl.readline(&format!("{}: ", label))?.trim().to_string())
}

/// Fill in fields the command line left out.
fn complete(cmd: Command, rl: &mut DefaultEditor) -> Result<Option<Command>> {
    Ok(Some(match cmd {
        Command::Login { email, password: None } => {
            let password = rl.readline("password: ")?;
            Command::Login { email, password: Some(password) }
        }
        Command::NewManual(_) => Command::NewManual(NewBrandManual {
            nombre: ask(rl, "nombre")?,
            producto: ask(rl, "producto")?,
            tono: ask(rl, "tono")?,
            publico_objetivo: ask(rl, "público objetivo")?,
            restricciones: ask(rl, "restricciones")?,
        }),
        Command::NewContent { manual_id, tipo, titulo } if manual_id.is_empty() || tipo.is_none() || titulo.is_empty() => {
            let manual_id = if manual_id.is_empty() { ask(rl, "manual id")? } else { manual_id };
            let tipo = match tipo {
                Some(t) => Some(t),
                None => ask(rl, "tipo (descripcion|guion_video|prompt_imagen)")?.parse::<TipoContenido>().ok(),
            };
            let titulo = if titulo.is_empty() { ask(rl, "título")? } else { titulo };
            Command::NewContent { manual_id, tipo, titulo }
        }
        Command::DeleteManual(id) => {
            let answer = ask(rl, &format!("¿Eliminar el manual {}? [s/N]", id))?;
            if !matches!(answer.to_ascii_lowercase().as_str(), "s" | "si" | "sí" | "y" | "yes") {
                return Ok(None);
            }
            Command::DeleteManual(id)
        }
        other => other,
    }))
}

/// Interactive loop. Returns on `quit`, EOF or Ctrl-C.
pub fn run_repl(rt: tokio::runtime::Runtime, mut shell: Shell) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("content-suite shell. Type 'help' for commands.");
    println!("{}", shell.render());
    loop {
        let prompt = format!("{}> ", shell.route());
        let line = match rl.readline(&prompt) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);
        let cmd = match Command::parse(line) {
            Ok(c) => c,
            Err(msg) => { eprintln!("{}", msg); continue; }
        };
        if cmd == Command::Quit {
            break;
        }
        let cmd = match complete(cmd, &mut rl) {
            Ok(Some(c)) => c,
            Ok(None) => { println!("cancelado"); continue; }
            Err(e) => { eprintln!("error: {}", e); continue; }
        };
        match rt.block_on(shell.execute(cmd)) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("error: {}", e.message()),
        }
    }
    Ok(())
}

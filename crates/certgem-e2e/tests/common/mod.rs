//! In-memory CertGem portal for workflow tests.
//!
//! Renders the login, welcome, detail and gemologist screens into a
//! [`MockDriver`] and keeps a certificate store behind them, so page objects
//! run their real flows without a browser.

#![allow(dead_code)]

use certgem_e2e::pages::{
    EMAIL_REQUIRED, ERROR_DETAIL, ERROR_SUMMARY, FORM_FIELD_IDS, PASSWORD_REQUIRED,
    SUCCESS_DETAIL, SUCCESS_SUMMARY,
};
use certgem_e2e::{
    AriaRole, CertificatesPage, GemologistsPage, LoginPage, MockDriver, MockElement, MockState,
    RouteAction, SuiteConfig, ToastKind, UrlPattern,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ORIGIN: &str = "http://localhost:4200";
pub const VALID_EMAIL: &str = "qa@certgem.dev";
pub const VALID_PASSWORD: &str = "gemas-123";
pub const LOGIN_ERROR: &str = "Erro no login Email ou senha incorretos. Tente novamente.";

/// Certificates the portal starts with, as `(id, gem name)`
pub const SEEDED: [(u32, &str); 3] = [
    (52, "J3X0Z4Uizu"),
    (53, "Safira Azul"),
    (54, "Topázio Imperial"),
];

const MAX_CARDS: usize = 32;

#[derive(Debug, Clone)]
pub struct StoredCertificate {
    pub id: u32,
    pub fields: HashMap<String, String>,
}

impl StoredCertificate {
    pub fn name(&self) -> &str {
        self.fields.get("gemName").map_or("", String::as_str)
    }
}

type Store = Arc<Mutex<Vec<StoredCertificate>>>;

fn store_lock(store: &Store) -> std::sync::MutexGuard<'_, Vec<StoredCertificate>> {
    store.lock().unwrap()
}

/// The fake portal and the driver it renders into
pub struct Portal {
    pub driver: Arc<MockDriver>,
    store: Store,
}

impl Portal {
    pub fn new() -> Self {
        let seeded = SEEDED
            .iter()
            .map(|(id, name)| StoredCertificate {
                id: *id,
                fields: HashMap::from([("gemName".to_string(), (*name).to_string())]),
            })
            .collect();
        let portal = Self {
            driver: Arc::new(MockDriver::new()),
            store: Arc::new(Mutex::new(seeded)),
        };
        portal.wire();
        portal
    }

    pub fn config(&self) -> SuiteConfig {
        SuiteConfig::default()
    }

    pub fn login_page(&self) -> LoginPage {
        LoginPage::new(self.driver.clone(), self.config())
    }

    pub fn certificates_page(&self) -> CertificatesPage {
        CertificatesPage::new(self.driver.clone(), self.config())
    }

    pub fn gemologists_page(&self) -> GemologistsPage {
        GemologistsPage::new(self.driver.clone(), self.config())
    }

    /// Stored certificate names in creation order
    pub fn names(&self) -> Vec<String> {
        store_lock(&self.store)
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn certificate(&self, name: &str) -> Option<StoredCertificate> {
        store_lock(&self.store).iter().find(|c| c.name() == name).cloned()
    }

    pub fn delete(&self, id: u32) {
        store_lock(&self.store).retain(|c| c.id != id);
    }

    fn wire(&self) {
        let store = self.store.clone();
        self.driver.on_page(UrlPattern::Any, move |s| {
            let url = s.url.clone();
            show(s, &store, &url);
        });

        self.driver.on_click("home-entrar", |s| show_static(s, "/login"));
        self.driver.on_fill("email", validate_login_form);
        self.driver.on_fill("senha", validate_login_form);

        let store = self.store.clone();
        self.driver.on_click("entrar", move |s| {
            if s.value("email") == VALID_EMAIL && s.value("senha") == VALID_PASSWORD {
                s.set_cookie("session", "qa-session");
                s.local_storage()
                    .insert("certgem.token".to_string(), "jwt-qa".to_string());
                show(s, &store, &format!("{ORIGIN}/welcome"));
            } else {
                s.after(Duration::from_millis(400), |s| {
                    s.remove("login-error");
                    s.insert(MockElement::new("login-error").with_text(LOGIN_ERROR));
                });
            }
        });

        let store = self.store.clone();
        self.driver.on_click("logout", move |s| {
            s.storage.cookies.retain(|c| c.name != "session");
            show(s, &store, &format!("{ORIGIN}/login"));
        });

        self.driver.on_click("create", |s| {
            for id in FORM_FIELD_IDS {
                s.remove(id);
                s.insert(MockElement::css(id, format!("#{id}")));
            }
            s.remove("save");
            s.insert(MockElement::new("save").with_text("Salvar Certificado"));
        });

        let store = self.store.clone();
        self.driver.on_click("save", move |s| {
            let fields: HashMap<String, String> = FORM_FIELD_IDS
                .iter()
                .map(|id| ((*id).to_string(), s.value(id)))
                .collect();
            if fields.get("gemName").map_or(true, |v| v.trim().is_empty()) {
                s.remove("gem-required");
                s.insert(MockElement::new("gem-required").with_text("Nome da gema é obrigatório"));
                return;
            }
            {
                let mut certs = store_lock(&store);
                let id = certs.iter().map(|c| c.id).max().unwrap_or(0) + 1;
                certs.push(StoredCertificate { id, fields });
            }
            show(s, &store, &format!("{ORIGIN}/welcome"));
        });

        let store = self.store.clone();
        self.driver.on_key("search", "Enter", move |s| {
            let query = s.value("search");
            let store = store.clone();
            s.after(Duration::from_millis(250), move |s| render_cards(s, &store, &query));
        });

        for i in 0..MAX_CARDS {
            let store = self.store.clone();
            let key = format!("card-{i}");
            let card = key.clone();
            self.driver.on_click(&key, move |s| {
                let name = s.element(&card).map(|e| e.text.clone()).unwrap_or_default();
                let id = store_lock(&store)
                    .iter()
                    .find(|c| c.name() == name)
                    .map(|c| c.id);
                if let Some(id) = id {
                    show(s, &store, &format!("{ORIGIN}/certificate?id={id}"));
                }
            });
        }
    }
}

impl Default for Portal {
    fn default() -> Self {
        Self::new()
    }
}

/// Screens that do not read the store
fn show_static(s: &mut MockState, path: &str) {
    let store: Store = Arc::new(Mutex::new(Vec::new()));
    show(s, &store, &format!("{ORIGIN}{path}"));
}

fn show(s: &mut MockState, store: &Store, url: &str) {
    s.url = url.to_string();
    s.title = "CertGem".to_string();
    s.elements.clear();
    s.focused = None;

    let path = url.strip_prefix(ORIGIN).unwrap_or(url);
    let (route, query) = path.split_once('?').unwrap_or((path, ""));
    match route {
        "" | "/" => {
            s.insert(MockElement::new("home-entrar").with_role(AriaRole::Link, "Entrar"));
        }
        "/login" => render_login(s),
        "/welcome" if s.has_cookie("session") => {
            s.insert(MockElement::new("logout").with_text("Logout"));
            s.insert(MockElement::new("create").with_text("Criar Certificado"));
            s.insert(MockElement::new("search").with_placeholder("Pesquisar"));
            render_cards(s, store, "");
        }
        "/welcome" => show(s, store, &format!("{ORIGIN}/login")),
        "/certificate" => render_detail(s, store, query),
        "/buscar-gemologos" => render_gemologists(s),
        _ => {}
    }
}

fn render_login(s: &mut MockState) {
    s.insert(
        MockElement::new("email")
            .with_role(AriaRole::Textbox, "Email")
            .with_label("Email"),
    );
    s.insert(
        MockElement::new("senha")
            .with_role(AriaRole::Textbox, "Senha")
            .with_label("Senha"),
    );
    s.insert(
        MockElement::new("entrar")
            .with_role(AriaRole::Button, "Entrar")
            .disabled(),
    );
}

/// Angular-style validation: submit enabled only with both fields filled,
/// required messages under blank fields
fn validate_login_form(s: &mut MockState) {
    let email_blank = s.value("email").trim().is_empty();
    let password_blank = s.value("senha").trim().is_empty();
    s.set_enabled("entrar", !email_blank && !password_blank);

    s.remove("email-required");
    if email_blank {
        s.insert(MockElement::new("email-required").with_text(EMAIL_REQUIRED));
    }
    s.remove("senha-required");
    if password_blank {
        s.insert(MockElement::new("senha-required").with_text(PASSWORD_REQUIRED));
    }
}

/// Case-sensitive substring search over gem names
fn render_cards(s: &mut MockState, store: &Store, filter: &str) {
    s.remove_where(|e| e.key.starts_with("card-"));
    let names: Vec<String> = store_lock(store)
        .iter()
        .map(|c| c.name().to_string())
        .filter(|name| filter.is_empty() || name.contains(filter))
        .take(MAX_CARDS)
        .collect();
    for (i, name) in names.into_iter().enumerate() {
        s.insert(MockElement::css(format!("card-{i}"), "div.gemologo-card").with_text(name));
    }
}

/// Unknown ids render the detail screen without data
fn render_detail(s: &mut MockState, store: &Store, query: &str) {
    let id = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("id="))
        .and_then(|id| id.parse::<u32>().ok());
    let Some(cert) = id.and_then(|id| store_lock(store).iter().find(|c| c.id == id).cloned()) else {
        return;
    };
    for field in FORM_FIELD_IDS {
        let value = cert.fields.get(field).cloned().unwrap_or_default();
        s.insert(MockElement::css(field, format!("#{field}")).with_value(value));
    }
}

fn toast(s: &mut MockState, kind: ToastKind, summary: &str, detail: &str) {
    s.insert(MockElement::css("toast", kind.css()));
    s.insert(
        MockElement::css("toast-summary", format!("{} .p-toast-summary", kind.css()))
            .with_text(summary),
    );
    s.insert(
        MockElement::css("toast-detail", format!("{} .p-toast-detail", kind.css()))
            .with_text(detail),
    );
}

/// The list fetch honours installed routes like the portal's XHR would
fn render_gemologists(s: &mut MockState) {
    s.insert(MockElement::css("title", "h1.title").with_text("Gemólogos Cadastrados"));
    s.insert(MockElement::css("loading", ".loading"));
    let delay = match s.route_for("http://localhost:8080/usuario/gemologos") {
        Some(RouteAction::Abort(_)) => {
            s.after(Duration::from_millis(150), |s| {
                s.remove("loading");
                toast(s, ToastKind::Error, ERROR_SUMMARY, ERROR_DETAIL);
            });
            return;
        }
        Some(action) => action.delay().unwrap_or_default(),
        None => Duration::ZERO,
    };
    s.after(delay + Duration::from_millis(150), |s| {
        s.remove("loading");
        s.insert(MockElement::css("grid", ".gemologos-grid"));
        for i in 0..5 {
            s.insert(MockElement::css(format!("gemologo-{i}"), ".gemologo-card"));
        }
        toast(s, ToastKind::Success, SUCCESS_SUMMARY, SUCCESS_DETAIL);
    });
}

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

pub const CAPTCHA_TTL: Duration = Duration::from_secs(5 * 60);
const CAPTCHA_LEN: usize = 4;
const WIDTH: u32 = 120;
const HEIGHT: u32 = 40;

#[derive(Debug, Clone)]
struct Entry {
    answer: String,
    expires_at: DateTime<Utc>,
}

/// A generated challenge: the id to send back on login, the rendered image,
/// and the plaintext answer.
#[derive(Debug, Clone)]
pub struct Captcha {
    pub id: String,
    pub image: String,
    pub answer: String,
}

/// In-memory captcha answers keyed by id. Cloning shares the same map.
#[derive(Clone)]
pub struct CaptchaStore {
    entries: Arc<DashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for CaptchaStore {
    fn default() -> Self {
        Self::new(CAPTCHA_TTL)
    }
}

impl CaptchaStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn generate(&self) -> Captcha {
        self.sweep_expired();

        let mut rng = rand::thread_rng();
        let answer: String = (0..CAPTCHA_LEN)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        let id = Uuid::new_v4().to_string();
        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::minutes(5));

        self.entries.insert(
            id.clone(),
            Entry {
                answer: answer.clone(),
                expires_at,
            },
        );

        Captcha {
            image: render_svg_data_uri(&answer, &mut rng),
            id,
            answer,
        }
    }

    /// One-shot check: the id is consumed whether or not the answer matches.
    pub fn verify(&self, id: &str, answer: &str) -> bool {
        let Some((_, entry)) = self.entries.remove(id) else {
            return false;
        };
        if entry.expires_at <= Utc::now() {
            debug!("captcha expired");
            return false;
        }
        entry.answer.eq_ignore_ascii_case(answer.trim())
    }

    fn sweep_expired(&self) {
        let now = Utc::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn render_svg_data_uri(answer: &str, rng: &mut impl Rng) -> String {
    let mut svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}"><rect width="100%" height="100%" fill="#f4f4f4"/>"##
    );

    for _ in 0..6 {
        let _ = write!(
            svg,
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="#{:06x}" stroke-width="1"/>"##,
            rng.gen_range(0..WIDTH),
            rng.gen_range(0..HEIGHT),
            rng.gen_range(0..WIDTH),
            rng.gen_range(0..HEIGHT),
            rng.gen_range(0x40_40_40..0xb0_b0_b0u32),
        );
    }

    let step = WIDTH / (answer.len() as u32 + 1);
    for (i, ch) in answer.chars().enumerate() {
        let _ = write!(
            svg,
            r##"<text x="{}" y="{}" font-family="monospace" font-size="24" fill="#{:06x}" transform="rotate({} {} {})">{ch}</text>"##,
            step * (i as u32 + 1) - 6,
            HEIGHT / 2 + 8,
            rng.gen_range(0x10_10_10..0x60_60_60u32),
            rng.gen_range(-20..=20),
            step * (i as u32 + 1),
            HEIGHT / 2,
        );
    }
    svg.push_str("</svg>");

    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

//! Synthetic github.com activity for demo fixtures
//!
//! Raw `copilot/usage` payloads carry no github.com chat or pull request
//! data. When converting sample payloads into demo fixtures those branches
//! are filled with plausible random values instead.

use crate::aggregation::DotcomSource;
use copilot_metrics_core::metrics::{
    DotcomChat, DotcomChatModel, DotcomPullRequests, PullRequestModel, PullRequestRepository,
};
use copilot_metrics_core::types::{DEFAULT_MODEL, RawDailyRecord};
use tracing::warn;

/// Source of uniformly distributed integers
pub trait RandomSource {
    /// Integer in `min..=max`
    fn int_in(&mut self, min: i64, max: i64) -> i64;
}

/// xorshift64* generator seeded from the operating system
#[derive(Debug, Clone)]
pub struct OsRandom {
    state: u64,
}

impl OsRandom {
    pub fn new() -> Self {
        let mut bytes = [0u8; 8];
        let seed = if getrandom::getrandom(&mut bytes).is_ok() {
            u64::from_le_bytes(bytes)
        } else {
            warn!("OS random source unavailable, seeding from the clock");
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0);
            nanos ^ (std::process::id() as u64).rotate_left(17)
        };
        Self::with_seed(seed)
    }

    /// Deterministic generator, mainly for benchmarks
    pub fn with_seed(seed: u64) -> Self {
        // xorshift gets stuck on zero
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

impl Default for OsRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for OsRandom {
    fn int_in(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min) as u64 + 1;
        min + (self.next_u64() % span) as i64
    }
}

/// Dotcom source producing random chat and pull request activity
///
/// - chat: 10 to 100 engaged users, two to five chats per user
/// - pull requests: 0 to 27 engaged users split over repository entries
///   sharing one `demo/repo-NNNN` name, two to five summaries per user
#[derive(Debug, Clone)]
pub struct Synthetic<R: RandomSource = OsRandom> {
    rng: R,
}

impl Synthetic<OsRandom> {
    pub fn new() -> Self {
        Self::with_source(OsRandom::new())
    }
}

impl Default for Synthetic<OsRandom> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource> Synthetic<R> {
    pub fn with_source(rng: R) -> Self {
        Self { rng }
    }

    /// Draw in `min..=max`, keeping misbehaving sources in bounds
    fn draw(&mut self, min: i64, max: i64) -> i64 {
        self.rng.int_in(min, max).clamp(min, max)
    }

    pub fn chat(&mut self) -> DotcomChat {
        let users = self.draw(10, 100);
        let chats = self.draw(users * 2, users * 5);
        DotcomChat {
            total_engaged_users: users,
            models: vec![DotcomChatModel {
                name: DEFAULT_MODEL.to_string(),
                is_custom_model: false,
                custom_model_training_date: None,
                total_engaged_users: users,
                total_chats: chats,
            }],
        }
    }

    pub fn pull_requests(&mut self) -> DotcomPullRequests {
        let users = self.draw(0, 27);
        let name = format!("demo/repo-{}", self.draw(5000, 6000));

        let mut repositories = Vec::new();
        let mut users_left = users;
        while users_left > 0 {
            let repo_users = self.draw(1, users_left);
            users_left -= repo_users;
            let summaries = self.draw(repo_users * 2, repo_users * 5);
            repositories.push(PullRequestRepository {
                name: name.clone(),
                total_engaged_users: repo_users,
                models: vec![PullRequestModel {
                    name: DEFAULT_MODEL.to_string(),
                    is_custom_model: false,
                    custom_model_training_date: None,
                    total_pr_summaries_created: summaries,
                    total_engaged_users: repo_users,
                }],
            });
        }

        DotcomPullRequests {
            total_engaged_users: users,
            repositories,
        }
    }
}

impl<R: RandomSource> DotcomSource for Synthetic<R> {
    fn dotcom_chat(&mut self, _raw: &RawDailyRecord) -> DotcomChat {
        self.chat()
    }

    fn dotcom_pull_requests(&mut self, _raw: &RawDailyRecord) -> DotcomPullRequests {
        self.pull_requests()
    }
}

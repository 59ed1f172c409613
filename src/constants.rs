/// Storage keys, shared with backups produced by the web app
pub const KEY_TASKS: &str = "bp_tasks";
pub const KEY_PRIZES: &str = "bp_prizes";
pub const KEY_STARS: &str = "bp_stars";
pub const KEY_REQUESTS: &str = "bp_requests";
pub const KEY_PROFILE: &str = "bp_profile";
pub const KEY_PIN: &str = "bp_parent_pin";
pub const KEY_APP_PASSWORD: &str = "bp_app_access_password";
pub const KEY_HISTORY: &str = "bp_star_history";

/// Every key that takes part in export & import, in export order
pub const ALL_KEYS: [&str; 8] = [
    KEY_TASKS,
    KEY_PRIZES,
    KEY_STARS,
    KEY_REQUESTS,
    KEY_PROFILE,
    KEY_PIN,
    KEY_APP_PASSWORD,
    KEY_HISTORY,
];

pub const DEFAULT_PARENT_PIN: &str = "8888";
pub const PIN_LENGTH: usize = 4;
pub const MIN_PASSWORD_LENGTH: usize = 4;

pub const DEFAULT_PRIZE_ICON: &str = "🎁";
pub const DEFAULT_TASK_ICON: &str = "✨";

pub const DEFAULT_PROFILE_NAME: &str = "Captain";
pub const DEFAULT_PROFILE_AVATAR: &str = "🧑‍🚀";

// Reason prefixes written into star history
pub const REDEEMED_PREFIX: &str = "Redeemed: ";
pub const REFUND_PREFIX: &str = "Refund: ";
pub const CONQUERED_PREFIX: &str = "Conquered ";
pub const BONUS_PREFIX: &str = "Parent Reward: ";
pub const PENALTY_PREFIX: &str = "Parent Penalty: ";

pub const BACKUP_FILE_PREFIX: &str = "brave_planet_backup_";

pub const DEFAULT_STORE_PATH: &str = "starledger.json";

/// Stars needed to climb one level
pub const STARS_PER_LEVEL: i64 = 20;

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// (name, icon, duration minutes, reward stars)
pub const SEED_TASKS: [(&str, &str, u32, i64); 3] = [
    ("Brush Teeth", "🪥", 2, 2),
    ("Read Book", "📖", 15, 5),
    ("Clean Room", "🧹", 10, 4),
];

/// (name, cost, icon)
pub const SEED_PRIZES: [(&str, i64, &str); 3] = [
    ("Ice Cream", 10, "🍦"),
    ("New Toy Car", 50, "🏎️"),
    ("Watch TV (1hr)", 15, "📺"),
];

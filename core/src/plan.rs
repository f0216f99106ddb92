//! The fixed migration plan: which routes get mounted in `server.js`, which
//! tables the backend expects, and which npm packages it needs.

/// One `app.use(...)` line to be added to the backend entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMount {
    pub label: String,
    pub mount_path: String,
    pub module: String,
}

impl RouteMount {
    fn new(label: &str, mount_path: &str, module: &str) -> Self {
        Self {
            label: label.into(),
            mount_path: mount_path.into(),
            module: module.into(),
        }
    }

    fn render(&self) -> String {
        format!(
            "        // ✅ {}\n        app.use('{}', require('{}'));\n",
            self.label, self.mount_path, self.module
        )
    }
}

/// Expected shape of a table created by the schema script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<String>,
}

impl TableSpec {
    fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Text insertion applied to the backend entry point.
#[derive(Debug, Clone)]
pub struct SourcePatch {
    /// Regular expression matching the line the block goes after.
    pub anchor: String,
    /// Substring whose presence means the block was already inserted.
    pub marker: String,
    pub insertion: String,
    /// Appended to the full file name to build the backup path.
    pub backup_suffix: String,
}

#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub mounts: Vec<RouteMount>,
    pub patch: SourcePatch,
    pub schema: String,
    pub tables: Vec<TableSpec>,
}

impl MigrationPlan {
    /// Render the block inserted after the anchor line.
    fn render_mounts(mounts: &[RouteMount]) -> String {
        let blocks: Vec<String> = mounts.iter().map(RouteMount::render).collect();
        format!("\n{}", blocks.join("\n"))
    }
}

impl Default for MigrationPlan {
    fn default() -> Self {
        let mounts = vec![
            RouteMount::new(
                "Routes utilisateurs RDS (SQLite)",
                "/api/users",
                "../backend/routes/userRoutes",
            ),
            RouteMount::new("Routes chat", "/api/chat", "../backend/routes/chatRoutes"),
            RouteMount::new(
                "Routes préférences",
                "/api/preferences",
                "../backend/routes/preferencesRoutes",
            ),
        ];
        let patch = SourcePatch {
            anchor: NOTIFICATIONS_ANCHOR.into(),
            marker: format!("require('{}')", mounts[0].module),
            insertion: Self::render_mounts(&mounts),
            backup_suffix: ".backup_auto".into(),
        };
        Self {
            mounts,
            patch,
            schema: SCHEMA.into(),
            tables: vec![
                TableSpec::new(
                    "chat_channels",
                    &[
                        "id",
                        "name",
                        "description",
                        "created_by",
                        "created_at",
                        "is_private",
                        "members",
                    ],
                ),
                TableSpec::new(
                    "chat_messages",
                    &[
                        "id",
                        "channel_id",
                        "user_id",
                        "username",
                        "message",
                        "timestamp",
                        "edited",
                        "reactions",
                    ],
                ),
                TableSpec::new("user_preferences", &["user_id", "preferences", "updated_at"]),
            ],
        }
    }
}

/// Packages the migrated backend requires at runtime.
pub const REQUIRED_PACKAGES: &[&str] = &["xlsx", "multer", "sqlite3"];

/// Route modules the new mounts point at, relative to the project root.
pub const ROUTE_FILES: &[&str] = &[
    "backend/routes/userRoutes.js",
    "backend/routes/chatRoutes.js",
    "backend/routes/preferencesRoutes.js",
];

const NOTIFICATIONS_ANCHOR: &str = r"app\.use\('/api/notifications',\s*notificationRoutes\);";

pub const SCHEMA: &str = r#"
-- chat
CREATE TABLE IF NOT EXISTS chat_channels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    created_by TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    is_private INTEGER DEFAULT 0,
    members TEXT
);

CREATE TABLE IF NOT EXISTS chat_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    channel_id INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    username TEXT NOT NULL,
    message TEXT NOT NULL,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
    edited INTEGER DEFAULT 0,
    reactions TEXT,
    FOREIGN KEY (channel_id) REFERENCES chat_channels(id)
);

-- preferences
CREATE TABLE IF NOT EXISTS user_preferences (
    user_id TEXT PRIMARY KEY,
    preferences TEXT NOT NULL,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
);
"#;

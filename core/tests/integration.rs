use std::{fs, path::Path};

use migration_finisher::{
    orchestrator::Stage, plan::ROUTE_FILES, Config, Orchestrator, Outcome,
};
use rusqlite::Connection;

const SERVER_JS: &str = "\
const express = require('express');
const notificationRoutes = require('../backend/routes/notificationRoutes');
const app = express();

async function startServer() {
        app.use('/api/notifications', notificationRoutes);
        app.use(express.static(buildPath));
}
";

/// Lay out a backend checkout the way the migration expects to find it.
fn checkout(dir: &Path, server_js: &str, manifest: Option<&str>) -> Config {
    for file in ROUTE_FILES {
        let path = dir.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "module.exports = router;\n").unwrap();
    }
    fs::create_dir_all(dir.join("server")).unwrap();
    fs::write(dir.join("server/server.js"), server_js).unwrap();
    if let Some(manifest) = manifest {
        fs::write(dir.join("package.json"), manifest).unwrap();
    }
    Config::for_root(dir)
}

fn run(cfg: &Config) -> (migration_finisher::RunSummary, String) {
    let mut orchestrator = Orchestrator::new(cfg, Vec::new());
    let summary = orchestrator.run();
    assert_eq!(orchestrator.stage(), Stage::Done);
    let out = String::from_utf8(orchestrator.into_output()).unwrap();
    (summary, out)
}

fn tables(db: &Path) -> Vec<String> {
    let conn = Connection::open(db).unwrap();
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .unwrap();
    let names = stmt.query_map([], |row| row.get::<_, String>(0)).unwrap();
    names.collect::<Result<Vec<_>, _>>().unwrap()
}

#[test]
fn fresh_checkout_missing_xlsx() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = checkout(
        tmp.path(),
        SERVER_JS,
        Some(r#"{"dependencies":{"multer":"^1.4.5","sqlite3":"^5.1.7"}}"#),
    );
    assert!(!cfg.database.exists());

    let (summary, out) = run(&cfg);

    assert!(summary.success());
    assert_eq!(summary.missing_packages, vec!["xlsx"]);
    assert_eq!(summary.outcome(), Outcome::PendingInstall(vec!["xlsx".into()]));
    assert_eq!(summary.exit_code(), 0);

    let patched = fs::read_to_string(&cfg.server_js).unwrap();
    assert_eq!(patched.matches(&cfg.plan.patch.marker).count(), 1);
    let backup = tmp.path().join("server/server.js.backup_auto");
    assert_eq!(fs::read_to_string(backup).unwrap(), SERVER_JS);

    assert_eq!(
        tables(&cfg.database),
        vec!["chat_channels", "chat_messages", "user_preferences"]
    );

    assert!(out.contains("🚀 FINALISATION MIGRATION SQLITE - AUTOMATIQUE"));
    assert!(out.contains("⚠️ Package manquant: xlsx"));
    assert!(out.contains("⚠️ Migration presque terminée"));
    assert!(out.contains("npm install xlsx"));
}

#[test]
fn anchor_absent_fails_without_touching_source() {
    let tmp = tempfile::tempdir().unwrap();
    let drifted = "const app = express();\napp.use('/api/alerts', alertRoutes);\n";
    let cfg = checkout(
        tmp.path(),
        drifted,
        Some(r#"{"dependencies":{"xlsx":"^0.18.5","multer":"^1.4.5","sqlite3":"^5.1.7"}}"#),
    );

    let (summary, out) = run(&cfg);

    assert!(!summary.patch_ok);
    assert!(!summary.success());
    assert_eq!(summary.outcome(), Outcome::Failed);
    assert_eq!(summary.exit_code(), 1);
    assert_eq!(fs::read(&cfg.server_js).unwrap(), drifted.as_bytes());
    assert!(!tmp.path().join("server/server.js.backup_auto").exists());
    assert!(out.contains("❌ Pattern d'insertion non trouvé dans server.js"));
    assert!(out.contains("❌ Erreurs détectées lors de la migration"));
}

#[test]
fn second_run_is_complete_and_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = checkout(
        tmp.path(),
        SERVER_JS,
        Some(r#"{"dependencies":{"xlsx":"^0.18.5","multer":"^1.4.5"},"devDependencies":{"sqlite3":"^5.1.7"}}"#),
    );

    let (first, _) = run(&cfg);
    assert_eq!(first.outcome(), Outcome::Complete);
    let after_first = fs::read(&cfg.server_js).unwrap();

    let (second, out) = run(&cfg);
    assert_eq!(second.outcome(), Outcome::Complete);
    assert_eq!(second.exit_code(), 0);
    assert_eq!(fs::read(&cfg.server_js).unwrap(), after_first);
    assert!(out.contains("⚠️ Routes déjà présentes dans server.js"));
    assert!(out.contains("✅ MIGRATION FINALISÉE AVEC SUCCÈS!"));
    assert!(out.contains("/api/users, /api/chat, /api/preferences"));
}

#[test]
fn missing_route_file_fails_but_later_stages_still_run() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = checkout(tmp.path(), SERVER_JS, None);
    fs::remove_file(tmp.path().join("backend/routes/chatRoutes.js")).unwrap();

    let (summary, out) = run(&cfg);

    assert!(!summary.routes_ok);
    assert!(summary.patch_ok);
    assert!(summary.schema_ok);
    assert!(summary.missing_packages.is_empty());
    assert_eq!(summary.exit_code(), 1);
    assert!(out.contains("❌ Route manquante: chatRoutes.js"));
    assert!(cfg.database.exists());
}

#[test]
fn missing_server_js_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = checkout(tmp.path(), SERVER_JS, None);
    fs::remove_file(&cfg.server_js).unwrap();

    let (summary, out) = run(&cfg);
    assert!(!summary.patch_ok);
    assert_eq!(summary.exit_code(), 1);
    assert!(out.contains("❌ Fichier non trouvé:"));
}

#[test]
fn malformed_manifest_is_logged_and_ignored() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = checkout(tmp.path(), SERVER_JS, Some("{not json"));

    let (summary, out) = run(&cfg);
    assert!(summary.missing_packages.is_empty());
    assert_eq!(summary.outcome(), Outcome::Complete);
    assert!(out.contains("❌ Erreur lors de la vérification npm:"));
}

#[test]
fn unusable_database_path_fails_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = checkout(tmp.path(), SERVER_JS, None);
    // parent "directory" is a regular file
    fs::write(tmp.path().join("database"), "").unwrap();
    cfg.database = tmp.path().join("database/docucortex.db");

    let (summary, out) = run(&cfg);
    assert!(!summary.schema_ok);
    assert_eq!(summary.exit_code(), 1);
    assert!(out.contains("❌ Erreur lors de la création des tables:"));
}

#[test]
fn strict_deps_turn_missing_packages_into_failure_code() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = checkout(tmp.path(), SERVER_JS, Some(r#"{"dependencies":{}}"#));
    cfg.strict_deps = true;

    let (summary, _) = run(&cfg);
    assert!(summary.success());
    assert_eq!(summary.missing_packages.len(), 3);
    assert_eq!(summary.exit_code(), 1);
}

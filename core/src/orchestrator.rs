use std::{io::Write, path::Path};

use tracing::debug;

use crate::{
    config::Config,
    deps::audit_dependencies,
    error::FinishError,
    patcher::{apply_patch, PatchOutcome},
    report::Reporter,
    routes::verify_route_files,
    schema::bootstrap_schema,
};

pub const BANNER: &str = "🚀 FINALISATION MIGRATION SQLITE - AUTOMATIQUE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NotStarted,
    VerifyingRoutes,
    PatchingServer,
    BootstrappingDb,
    AuditingDeps,
    Done,
}

impl Stage {
    fn next(self) -> Self {
        match self {
            Stage::NotStarted => Stage::VerifyingRoutes,
            Stage::VerifyingRoutes => Stage::PatchingServer,
            Stage::PatchingServer => Stage::BootstrappingDb,
            Stage::BootstrappingDb => Stage::AuditingDeps,
            Stage::AuditingDeps | Stage::Done => Stage::Done,
        }
    }
}

/// How a run ended, from the operator's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Complete,
    PendingInstall(Vec<String>),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub routes_ok: bool,
    pub patch_ok: bool,
    pub schema_ok: bool,
    pub missing_packages: Vec<String>,
    pub strict_deps: bool,
}

impl RunSummary {
    /// Route verification, patching and bootstrapping all succeeded.
    pub fn success(&self) -> bool {
        self.routes_ok && self.patch_ok && self.schema_ok
    }

    /// A failed stage outranks missing packages.
    pub fn outcome(&self) -> Outcome {
        if !self.success() {
            Outcome::Failed
        } else if !self.missing_packages.is_empty() {
            Outcome::PendingInstall(self.missing_packages.clone())
        } else {
            Outcome::Complete
        }
    }

    pub fn exit_code(&self) -> u8 {
        let deps_block = self.strict_deps && !self.missing_packages.is_empty();
        if self.success() && !deps_block {
            0
        } else {
            1
        }
    }
}

/// Drives the four stages in order and prints the final summary.
pub struct Orchestrator<'a, W: Write> {
    config: &'a Config,
    reporter: Reporter<W>,
    stage: Stage,
}

impl<'a, W: Write> Orchestrator<'a, W> {
    pub fn new(config: &'a Config, out: W) -> Self {
        Self {
            config,
            reporter: Reporter::new(out),
            stage: Stage::NotStarted,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self) {
        self.stage = self.stage.next();
        debug!(stage = ?self.stage, "entering stage");
    }

    pub fn run(&mut self) -> RunSummary {
        self.reporter.banner(BANNER);
        self.reporter
            .info(format!("Projet: {}", self.config.project_root.display()));

        self.advance();
        let routes_ok = self.verify_routes();
        if !routes_ok {
            self.reporter
                .error("Certaines routes backend sont manquantes!");
        }

        self.advance();
        let patch_ok = self.patch_server();

        self.advance();
        let schema_ok = self.bootstrap_db();

        self.advance();
        let missing_packages = self.audit_deps();

        self.advance();
        let summary = RunSummary {
            routes_ok,
            patch_ok,
            schema_ok,
            missing_packages,
            strict_deps: self.config.strict_deps,
        };
        self.print_summary(&summary);
        summary
    }

    fn verify_routes(&mut self) -> bool {
        self.reporter
            .info("Vérification des fichiers de routes backend...");
        let check = verify_route_files(&self.config.route_files);
        for path in &check.found {
            self.reporter
                .success(format!("Route trouvée: {}", file_name(path)));
        }
        for path in &check.missing {
            self.reporter
                .error(format!("Route manquante: {}", file_name(path)));
        }
        check.all_present()
    }

    fn patch_server(&mut self) -> bool {
        self.reporter.info("Ajout des routes dans server.js...");
        match apply_patch(&self.config.server_js, &self.config.plan.patch) {
            Ok(PatchOutcome::AlreadyApplied) => {
                self.reporter
                    .warning("Routes déjà présentes dans server.js");
                true
            }
            Ok(PatchOutcome::Applied { backup }) => {
                self.reporter
                    .info(format!("Backup créé: {}", backup.display()));
                self.reporter
                    .success("Routes ajoutées avec succès dans server.js");
                true
            }
            Err(FinishError::NotFound(path)) => {
                self.reporter
                    .error(format!("Fichier non trouvé: {}", path.display()));
                false
            }
            Err(FinishError::AnchorMissing(_)) => {
                self.reporter
                    .error("Pattern d'insertion non trouvé dans server.js");
                false
            }
            Err(e) => {
                self.reporter
                    .error(format!("Erreur lors du patch de server.js: {e}"));
                false
            }
        }
    }

    fn bootstrap_db(&mut self) -> bool {
        self.reporter.info("Création des tables SQLite...");
        match bootstrap_schema(&self.config.database, &self.config.plan) {
            Ok(report) => {
                for table in &report.present {
                    self.reporter
                        .success(format!("Table '{table}' créée/vérifiée"));
                }
                for table in &report.missing {
                    self.reporter
                        .error(format!("Table '{table}' manquante"));
                }
                for (table, column) in &report.missing_columns {
                    self.reporter.warning(format!(
                        "Colonne '{column}' absente de la table existante '{table}'"
                    ));
                }
                self.reporter
                    .info(format!("Base de données: {}", report.path.display()));
                report.all_present()
            }
            Err(e) => {
                self.reporter
                    .error(format!("Erreur lors de la création des tables: {e}"));
                false
            }
        }
    }

    fn audit_deps(&mut self) -> Vec<String> {
        self.reporter.info("Vérification des dépendances npm...");
        match audit_dependencies(&self.config.manifest, &self.config.required_packages) {
            Ok(audit) => {
                if !audit.manifest_present {
                    debug!(manifest = %self.config.manifest.display(), "no manifest, audit skipped");
                }
                for name in &audit.missing {
                    self.reporter
                        .warning(format!("Package manquant: {name}"));
                }
                for name in &audit.found {
                    self.reporter.success(format!("Package trouvé: {name}"));
                }
                if !audit.missing.is_empty() {
                    self.reporter.info(format!(
                        "Packages à installer: {}",
                        audit.missing.join(", ")
                    ));
                }
                audit.missing
            }
            Err(e) => {
                self.reporter
                    .error(format!("Erreur lors de la vérification npm: {e}"));
                Vec::new()
            }
        }
    }

    fn print_summary(&mut self, summary: &RunSummary) {
        self.reporter.blank();
        self.reporter.rule();
        match summary.outcome() {
            Outcome::Complete => {
                self.reporter
                    .success("MIGRATION FINALISÉE AVEC SUCCÈS!");
                let endpoints: Vec<&str> = self
                    .config
                    .plan
                    .mounts
                    .iter()
                    .map(|m| m.mount_path.as_str())
                    .collect();
                self.reporter.steps(
                    "Prochaines étapes:",
                    &[
                        "Redémarrer le serveur backend".into(),
                        "Vérifier la console pour les erreurs".into(),
                        format!("Tester les endpoints: {}", endpoints.join(", ")),
                    ],
                );
            }
            Outcome::PendingInstall(missing) => {
                self.reporter.warning("Migration presque terminée");
                self.reporter.steps(
                    "Action requise:",
                    &[
                        install_hint(&missing),
                        "Puis redémarrer le serveur".into(),
                    ],
                );
            }
            Outcome::Failed => {
                self.reporter
                    .error("Erreurs détectées lors de la migration");
                let mut steps =
                    vec!["Consultez les messages ci-dessus pour plus de détails".to_string()];
                if !summary.missing_packages.is_empty() {
                    steps.push(install_hint(&summary.missing_packages));
                }
                self.reporter.steps("Action requise:", &steps);
            }
        }
        self.reporter.rule();
        self.reporter.blank();
    }

    pub fn into_output(self) -> W {
        self.reporter.into_inner()
    }
}

fn install_hint(missing: &[String]) -> String {
    format!(
        "Installer les packages manquants: npm install {}",
        missing.join(" ")
    )
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// floe-core/src/application/pipeline.rs

use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::error::FloeError;
use crate::ports::EnvSource;

// Domain
use crate::domain::compiler::{
    ArtifactGenerator, CompiledArtifacts, GenerationInput, source_hash,
};
use crate::domain::governance::{EnforcementOptions, EnforcementResult, PolicyEnforcer};
use crate::domain::identity::{Principal, authorize};
use crate::domain::plugin::{CapabilityKind, PluginConfig, PluginRegistry};
use crate::domain::quality::{CheckResult, QualityReport, QualityScorer, ScoringTarget};
use crate::domain::resolution::{Resolution, Resolver};
use crate::domain::spec::{FloeSpec, ManifestChain};

// Infrastructure
use crate::infrastructure::config::{DEFAULT_TARGET, EnvOverrides, load_manifest_chain, load_spec};
use crate::infrastructure::error::InfrastructureError;

/// Identity provider used for RBAC when the manifest selects none.
pub const DEFAULT_IDENTITY_PROVIDER: &str = "env";

/// Collaborators of one compilation. Nothing is global: tests pass their own
/// registry and a map as the environment.
pub struct CompileContext<'a> {
    pub registry: &'a PluginRegistry,
    pub env: &'a dyn EnvSource,
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Reference date for override expiry.
    pub today: NaiveDate,
    /// Stamped into the artifacts; leave `None` for reproducible output.
    pub compiled_at: Option<String>,
    /// dbt target name of the platform compute.
    pub target: String,
    pub include_context: bool,
    pub parallel_validators: bool,
    /// Abort with `EnforcementFailed` instead of producing artifacts.
    pub fail_on_violations: bool,
    /// Observed check outcomes fed to the scorer.
    pub check_results: Vec<CheckResult>,
}

impl CompileOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            compiled_at: None,
            target: DEFAULT_TARGET.to_string(),
            include_context: false,
            parallel_validators: true,
            fail_on_violations: true,
            check_results: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct CompileOutcome {
    pub resolution: Resolution,
    pub principal: Option<Principal>,
    pub enforcement: EnforcementResult,
    pub quality: QualityReport,
    pub artifacts: CompiledArtifacts,
    pub digest: String,
}

/// Result of the first three stages, shared by `compile` and `enforce`.
#[derive(Debug)]
pub struct EnforcementOutcome {
    pub resolution: Resolution,
    pub principal: Option<Principal>,
    pub enforcement: EnforcementResult,
}

/// Resolve -> authorize -> enforce. Violations are data: the result is
/// returned whether it passed or not.
#[instrument(skip_all, fields(product = %spec.metadata.name))]
pub fn enforce(
    spec: &FloeSpec,
    chain: &ManifestChain,
    ctx: &CompileContext<'_>,
    options: &CompileOptions,
) -> Result<EnforcementOutcome, FloeError> {
    // 1. RESOLVE
    let resolution = Resolver::new(ctx.registry).resolve(spec, chain)?;
    info!(
        models = resolution.models.len(),
        compute = resolution.compute_name(),
        mode = ?resolution.mode,
        "Resolution complete"
    );

    // 2. IDENTITY
    let principal = authorize_principal(&resolution, ctx)?;

    // 3. ENFORCE
    let enforcer = PolicyEnforcer::new(resolution.governance())?;
    let mut enforce_options = EnforcementOptions::new(options.today);
    enforce_options.include_context = options.include_context;
    enforce_options.parallel = options.parallel_validators;
    let enforcement = enforcer.enforce(&resolution.graph(), &enforce_options)?;

    Ok(EnforcementOutcome {
        resolution,
        principal,
        enforcement,
    })
}

/// Resolve -> authorize -> enforce -> score -> generate. Stages run in order
/// and the first fatal error stops the run: no partial artifacts.
#[instrument(skip_all, fields(product = %spec.metadata.name))]
pub fn compile(
    spec: &FloeSpec,
    chain: &ManifestChain,
    ctx: &CompileContext<'_>,
    options: &CompileOptions,
) -> Result<CompileOutcome, FloeError> {
    let EnforcementOutcome {
        resolution,
        principal,
        enforcement,
    } = enforce(spec, chain, ctx, options)?;

    if !enforcement.passed() {
        if options.fail_on_violations {
            return Err(FloeError::EnforcementFailed {
                error_count: enforcement.error_count(),
                result: Box::new(enforcement),
            });
        }
        warn!(
            errors = enforcement.error_count(),
            "Enforcement failed, continuing as requested"
        );
    }

    // 4. SCORE
    let governance = resolution.governance();
    let targets: Vec<ScoringTarget> = resolution
        .models
        .iter()
        .map(|m| ScoringTarget {
            model: m.name.clone(),
            min_score: governance
                .quality_gates
                .as_ref()
                .and_then(|g| g.min_score(m.tier)),
        })
        .collect();
    let quality =
        QualityScorer::new(governance.scoring())?.score_all(&targets, &options.check_results)?;
    let below: Vec<&str> = quality
        .models
        .values()
        .filter(|s| !s.meets_threshold)
        .map(|s| s.model.as_str())
        .collect();
    if !below.is_empty() {
        warn!(models = ?below, "Models below their tier min_score");
    }

    // 5. GENERATE
    let artifacts = ArtifactGenerator::new(ctx.registry).generate(&GenerationInput {
        resolution: &resolution,
        enforcement: enforcement.summary(),
        quality: &quality,
        source_hash: source_hash(spec, chain)?,
        target: &options.target,
        compiled_at: options.compiled_at.clone(),
        compiled_by: principal.as_ref().map(|p| p.name.clone()),
    })?;
    let digest = artifacts.digest()?;
    info!(%digest, aggregate_score = quality.aggregate_score, "Compilation complete");

    Ok(CompileOutcome {
        resolution,
        principal,
        enforcement,
        quality,
        artifacts,
        digest,
    })
}

fn authorize_principal(
    resolution: &Resolution,
    ctx: &CompileContext<'_>,
) -> Result<Option<Principal>, FloeError> {
    let rbac = resolution.governance().rbac();
    if !rbac.is_enabled() {
        return Ok(None);
    }
    let (provider, config) = match resolution.plugin(CapabilityKind::Identity) {
        Some(p) => (p.name.as_str(), p.config.clone()),
        None => (DEFAULT_IDENTITY_PROVIDER, PluginConfig::new()),
    };
    let identity = ctx.registry.identity(provider)?;
    Ok(authorize(&rbac, identity.as_ref(), &config, ctx.env)?)
}

/// Loads both documents and applies the environment overrides
/// (`FLOE_ENFORCEMENT_LEVEL`).
pub fn load_inputs(
    spec_path: &Path,
    manifest_path: &Path,
    env: &dyn EnvSource,
) -> Result<(FloeSpec, ManifestChain), FloeError> {
    let spec = load_spec(spec_path).map_err(InfrastructureError::from)?;
    let mut chain = load_manifest_chain(manifest_path).map_err(InfrastructureError::from)?;
    EnvOverrides::from_env(env)?.apply(&mut chain);
    Ok((spec, chain))
}

#[instrument(skip(ctx, options))]
pub fn compile_files(
    spec_path: &Path,
    manifest_path: &Path,
    ctx: &CompileContext<'_>,
    options: &CompileOptions,
) -> Result<CompileOutcome, FloeError> {
    let (spec, chain) = load_inputs(spec_path, manifest_path, ctx.env)?;
    compile(&spec, &chain, ctx, options)
}

#[instrument(skip(ctx, options))]
pub fn enforce_files(
    spec_path: &Path,
    manifest_path: &Path,
    ctx: &CompileContext<'_>,
    options: &CompileOptions,
) -> Result<EnforcementOutcome, FloeError> {
    let (spec, chain) = load_inputs(spec_path, manifest_path, ctx.env)?;
    enforce(&spec, &chain, ctx, options)
}

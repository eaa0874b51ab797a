//! Extract command implementation.

use super::{apply_chunk_overrides, load_schema, read_document};
use crate::cli::{ExtractArgs, PresetArg, ProviderArg, StrategyArg};
use crate::config::{Config, ProviderKind, ProviderSettings};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use sift_domain::traits::LlmProvider;
use sift_domain::Document;
use sift_extractor::{
    BruteForce, ExtractionPipeline, ExtractionReport, ExtractionSchema, ExtractionStatus,
    ExtractorClient, ExtractorConfig, ExtractorError, FailurePolicy, RetrievalSelector,
    RetrievalStrategy, SegmentStrategy,
};
use sift_llm::{ollama, openai, MockProvider, OllamaProvider, OpenAiProvider};
use sift_store::embedding::HashedEmbeddingModel;
use tracing::debug;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let schema = load_schema(args.schema.as_ref())?;
    let document = read_document(args.input.as_deref())?;

    let report = run_extract(&args, config, schema.clone(), &document).await?;
    println!("{}", formatter.format_report(&report, &schema)?);

    if report.status() == ExtractionStatus::Failed {
        return Err(CliError::AllSegmentsFailed(report.failures.len()));
    }
    Ok(())
}

/// Run the pipeline for `document` with settings from the config file and flags.
pub async fn run_extract(
    args: &ExtractArgs,
    config: &Config,
    schema: ExtractionSchema,
    document: &Document,
) -> Result<ExtractionReport> {
    let (extractor_config, provider) = resolve_settings(args, config);
    extractor_config.validate()?;
    let strategy = build_strategy(args, &extractor_config)?;

    debug!("Using provider {:?} with model '{}'", provider.kind, provider.model);

    let timeout = extractor_config.request_timeout();
    match provider.kind {
        ProviderKind::Mock => {
            let mock = MockProvider::default().with_model_name(provider.model.clone());
            run_with(mock, schema, &extractor_config, document, strategy.as_ref()).await
        }
        ProviderKind::Ollama => {
            let endpoint = provider.endpoint.as_deref().unwrap_or(ollama::DEFAULT_ENDPOINT);
            let ollama = OllamaProvider::with_timeout(endpoint, provider.model.clone(), timeout)?;
            run_with(ollama, schema, &extractor_config, document, strategy.as_ref()).await
        }
        ProviderKind::OpenAi => {
            let api_key = std::env::var(&provider.api_key_env).map_err(|_| {
                CliError::Config(format!("Environment variable {} is not set", provider.api_key_env))
            })?;
            let base_url = provider.endpoint.as_deref().unwrap_or(openai::DEFAULT_BASE_URL);
            let openai = OpenAiProvider::new(&api_key, base_url, provider.model.clone(), timeout)?;
            run_with(openai, schema, &extractor_config, document, strategy.as_ref()).await
        }
    }
}

/// Merge the config file, preset and command-line flags; flags win.
pub fn resolve_settings(args: &ExtractArgs, config: &Config) -> (ExtractorConfig, ProviderSettings) {
    let mut extractor = match args.preset {
        Some(PresetArg::Default) => ExtractorConfig::default(),
        Some(PresetArg::Aggressive) => ExtractorConfig::aggressive(),
        Some(PresetArg::Lenient) => ExtractorConfig::lenient(),
        None => config.extractor.clone(),
    };

    apply_chunk_overrides(&mut extractor.chunk, &args.chunking);
    if let Some(concurrency) = args.concurrency {
        extractor.max_concurrency = concurrency;
    }
    if let Some(top_k) = args.top_k {
        extractor.retrieval.top_k = top_k;
    }
    if args.dedup {
        extractor.deduplicate = true;
    }
    if args.fail_fast {
        extractor.failure_policy = FailurePolicy::AbortOnFirstError;
    }

    let mut provider = config.provider.clone();
    if let Some(kind) = args.provider {
        provider.kind = match kind {
            ProviderArg::Mock => ProviderKind::Mock,
            ProviderArg::Ollama => ProviderKind::Ollama,
            ProviderArg::Openai => ProviderKind::OpenAi,
        };
    }
    if let Some(model) = &args.model {
        provider.model = model.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        provider.endpoint = Some(endpoint.clone());
    }

    (extractor, provider)
}

fn build_strategy(args: &ExtractArgs, config: &ExtractorConfig) -> Result<Box<dyn SegmentStrategy>> {
    match args.strategy {
        StrategyArg::Brute => Ok(Box::new(BruteForce)),
        StrategyArg::Retrieval => {
            let query = args.query.clone().ok_or_else(|| {
                CliError::InvalidInput("--query is required with --strategy retrieval".to_string())
            })?;
            let retrieval = &config.retrieval;
            let selector = RetrievalSelector::new(
                HashedEmbeddingModel::new(retrieval.embedding_dimension),
                retrieval.top_k,
                retrieval.ef_search,
            )?;
            Ok(Box::new(RetrievalStrategy::new(selector, query)))
        }
    }
}

async fn run_with<L>(
    provider: L,
    schema: ExtractionSchema,
    config: &ExtractorConfig,
    document: &Document,
    strategy: &dyn SegmentStrategy,
) -> Result<ExtractionReport>
where
    L: LlmProvider + Send + Sync + 'static,
    ExtractorError: From<L::Error>,
{
    let client = ExtractorClient::new(provider, schema, config.request_timeout())?;
    let pipeline = ExtractionPipeline::with_client(client, config)?;
    Ok(pipeline.run(document, strategy).await?)
}

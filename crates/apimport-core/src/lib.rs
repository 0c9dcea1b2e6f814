pub mod config;
pub mod error;
pub mod load;
pub mod model;
pub mod parse;
pub mod transform;

use log::info;

use config::ImportConfig;
use error::ImportError;
use load::{DescriptorFetcher, HttpFetcher};
use model::{ApiModel, ImportRequest};
use transform::ConvertOptions;

/// Run the full pipeline for one request: load, parse, detect the dialect and
/// convert. Fetch and parse failures are fatal; reference problems are not.
pub fn import(
    request: &ImportRequest,
    config: &ImportConfig,
    fetcher: &dyn DescriptorFetcher,
) -> Result<ApiModel, ImportError> {
    let descriptor = load::load(request, fetcher)?;
    let parsed = parse::parse_descriptor(&descriptor.text)?;

    let options = ConvertOptions {
        generate_mocks: request.generate_mocks,
        ..ConvertOptions::from_config(config)
    };
    let model = transform::convert_with_options(&parsed, &options);
    info!(
        "imported {} descriptor '{}': {} paths, {} endpoints",
        parsed.dialect,
        model.name,
        model.paths.len(),
        model.endpoints.len()
    );
    Ok(model)
}

/// [`import`] with the default configuration and the `reqwest` fetcher.
pub fn import_with_defaults(request: &ImportRequest) -> Result<ApiModel, ImportError> {
    let config = ImportConfig::default();
    import(request, &config, &HttpFetcher::new(&config.fetch))
}

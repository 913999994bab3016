use anyhow::Result;

use crate::cli::ClassifyArgs;
use crate::commands::CommandReport;
use crate::journal::classify::Classifier;
use crate::journal::clean::clean_text;
use crate::journal::config;
use crate::journal::paths::resolve_paths;

pub fn run(args: &ClassifyArgs) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = config::load_config_from(&paths.config_file)?;
    cfg.rules.validate()?;

    let classifier = Classifier::new(&cfg.rules);
    let text = clean_text(&args.text.join(" "));
    let result = classifier.classify(&text);

    let mut report = CommandReport::new("classify");
    report.detail(format!("text={text}"));
    report.detail(format!("category={}", result.category));
    if let Some(track) = &result.track {
        report.detail(format!("track={track}"));
    }
    if let Some(facet) = &result.facet {
        report.detail(format!("facet={facet}"));
    }
    report.detail(format!("priority={}", result.priority.as_str()));
    report.detail(format!("learning={}", classifier.is_learning(&text)));
    report.detail(format!("deep_work={}", classifier.is_deep_work(&text)));
    Ok(report)
}

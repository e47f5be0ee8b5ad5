//! Site reporter
//!
//! Runs the aggregation pipeline for one site: parse every run, annotate
//! entries from the network-activity logs, add the median record, pick
//! the representative run, reconcile URLs, summarise by type and party.

use crate::metrics::carbon::{CarbonEstimator, CarbonModel};
use crate::metrics::classify::{annotate_entries, build_cache_summary, PartyMatcher};
use crate::metrics::median::{median, select_representative, with_average};
use crate::metrics::reconcile::reconcile_resources;
use crate::metrics::types::{aggregate_by_type, summarize_run_by_type};
use crate::models::{Co2Row, DataQualityIssue, HostingFacts, Iteration, NetworkEntry, RunMetrics, SiteReport};
use crate::parser::devtools::NetworkLog;
use crate::parser::trace::parse_report;
use crate::parser::{ParserError, SiteInputs};
use crate::PipelineError;

/// Settings shared by every site of a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSettings {
    pub carbon_model: CarbonModel,
    /// Extra domains counted as first-party for every site
    pub parent_domains: Vec<String>,
}

/// Build the complete report for one site from its raw run documents
pub fn build_site_report(
    inputs: &SiteInputs,
    hosting: HostingFacts,
    settings: &ReportSettings,
) -> Result<SiteReport, PipelineError> {
    if inputs.runs.is_empty() {
        return Err(ParserError::NoRuns(inputs.site.clone()).into());
    }

    let matcher = PartyMatcher::for_site(&inputs.site, &settings.parent_domains);
    let estimator = CarbonEstimator::new(settings.carbon_model, hosting.green_hosted);
    let mut data_quality = Vec::new();

    let mut raw_runs: Vec<RunMetrics> = Vec::with_capacity(inputs.runs.len());
    let mut run_entries: Vec<Vec<NetworkEntry>> = Vec::with_capacity(inputs.runs.len());

    for run in &inputs.runs {
        let parsed = parse_report(&run.report, run.run_number, &run.filename, &matcher, &estimator);
        if parsed.missing_network_data {
            data_quality.push(DataQualityIssue::MissingTraceData {
                run: run.run_number,
            });
        }

        let entries = match &run.network_log {
            Some(raw_log) => {
                let log = NetworkLog::from_events(raw_log);
                for key in log.unresolved_keys() {
                    tracing::warn!(
                        "Run {} of {}: header event without a resolvable URL stored as {}",
                        run.run_number,
                        inputs.site,
                        key
                    );
                    data_quality.push(DataQualityIssue::UnresolvableHeaderEvent {
                        run: run.run_number,
                        key: key.clone(),
                    });
                }
                annotate_entries(parsed.entries, &log)
            }
            None => {
                data_quality.push(DataQualityIssue::MissingNetworkLog {
                    run: run.run_number,
                });
                parsed.entries
            }
        };

        raw_runs.push(parsed.metrics);
        run_entries.push(entries);
    }

    let runs = with_average(raw_runs);
    let (raw, average) = runs.split_at(runs.len() - 1);
    let average_total = average.first().map(|a| a.total_bytes).unwrap_or(0.0);

    let totals: Vec<f64> = raw.iter().map(|r| r.total_bytes).collect();
    let representative_index = select_representative(&totals, average_total).unwrap_or(0);
    let representative_run = raw
        .get(representative_index)
        .and_then(|r| r.iteration.run_number())
        .unwrap_or(1);

    tracing::info!(
        "{}: median total {} bytes, representative run {}",
        inputs.site,
        average_total,
        representative_run
    );

    let resources = reconcile_resources(&run_entries, &matcher, &estimator);
    let summary_by_type = aggregate_by_type(&resources, &estimator);
    let representative_summary_by_type = run_entries
        .get(representative_index)
        .map(|entries| summarize_run_by_type(entries, &estimator))
        .unwrap_or_default();

    let co2 = co2_rows(&runs, hosting.green_hosted);

    let (cache_summary, url_issues) = build_cache_summary(&resources, &matcher);
    data_quality.extend(url_issues);

    if !data_quality.is_empty() {
        tracing::warn!("{}: {} data quality issue(s)", inputs.site, data_quality.len());
    }

    Ok(SiteReport {
        site: inputs.site.clone(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        carbon_model: settings.carbon_model,
        runs,
        representative_run,
        resources,
        summary_by_type,
        representative_summary_by_type,
        co2,
        hosting,
        cache_summary,
        data_quality,
    })
}

/// Per-run CO2 under both models, followed by a median row
fn co2_rows(runs: &[RunMetrics], green_hosted: bool) -> Vec<Co2Row> {
    let row = |iteration: Iteration, total_bytes: f64| Co2Row {
        iteration,
        total_bytes,
        co2_g_one_byte: CarbonModel::OneByte.co2_grams(total_bytes, green_hosted),
        co2_g_swd: CarbonModel::SustainableWebDesign.co2_grams(total_bytes, green_hosted),
    };

    let mut rows: Vec<Co2Row> = runs
        .iter()
        .filter(|r| !r.is_average())
        .map(|r| row(r.iteration, r.total_bytes))
        .collect();

    let column = |f: fn(&Co2Row) -> f64| median(&rows.iter().map(f).collect::<Vec<_>>());
    let median_row = Co2Row {
        iteration: Iteration::Average,
        total_bytes: column(|r| r.total_bytes),
        co2_g_one_byte: column(|r| r.co2_g_one_byte),
        co2_g_swd: column(|r| r.co2_g_swd),
    };
    rows.push(median_row);

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceType;
    use crate::parser::RunInput;
    use serde_json::{json, Value};

    fn item(url: &str, resource_type: &str, transfer: u64) -> Value {
        json!({
            "url": url,
            "resourceType": resource_type,
            "mimeType": "",
            "transferSize": transfer,
            "resourceSize": transfer * 2,
            "statusCode": 200
        })
    }

    fn report(score: f64, items: Vec<Value>) -> Value {
        json!({
            "categories": { "performance": { "score": score } },
            "audits": {
                "largest-contentful-paint": { "numericValue": 1000.0 },
                "network-requests": { "details": { "items": items } }
            }
        })
    }

    fn run(run_number: u32, report: Value, network_log: Option<Value>) -> RunInput {
        RunInput {
            run_number,
            filename: format!("t-lhr-{}.json", run_number),
            report,
            network_log,
        }
    }

    fn three_run_inputs() -> SiteInputs {
        SiteInputs {
            site: "ulstein.kommune.no".to_string(),
            runs: vec![
                run(
                    1,
                    report(0.9, vec![
                        item("https://ulstein.kommune.no/app.js", "Script", 700),
                        item("https://ulstein.kommune.no/hero.jpg", "Image", 300),
                    ]),
                    Some(json!([])),
                ),
                run(
                    2,
                    report(0.8, vec![
                        item("https://ulstein.kommune.no/app.js", "Script", 800),
                        item("https://ulstein.kommune.no/hero.jpg", "Image", 200),
                        item("https://ads.example.com/banner.gif", "Image", 200),
                    ]),
                    Some(json!([])),
                ),
                run(
                    3,
                    report(0.7, vec![
                        item("https://ulstein.kommune.no/app.js", "Script", 800),
                        item("https://ulstein.kommune.no/hero.jpg", "Image", 200),
                        item("https://ulstein.kommune.no/page", "Other", 100),
                    ]),
                    Some(json!([])),
                ),
            ],
        }
    }

    #[test]
    fn test_end_to_end_representative_run() {
        let report = build_site_report(
            &three_run_inputs(),
            HostingFacts::unknown("ulstein.kommune.no"),
            &ReportSettings::default(),
        )
        .unwrap();

        // Raw totals [1000, 1200, 1100] plus the average record
        assert_eq!(report.runs.len(), 4);
        let totals: Vec<f64> = report.raw_runs().map(|r| r.total_bytes).collect();
        assert_eq!(totals, vec![1000.0, 1200.0, 1100.0]);

        let average = report.average().unwrap();
        assert_eq!(average.total_bytes, 1100.0);
        assert_eq!(average.performance_score, 80.0);
        assert_eq!(report.representative_run, 3);

        let script = report.representative_type(ResourceType::Script).unwrap();
        let image = report.representative_type(ResourceType::Image).unwrap();
        assert_eq!(script.transfer_bytes, 800);
        assert_eq!(image.transfer_bytes, 200);

        let pct_sum: f64 = report
            .representative_summary_by_type
            .iter()
            .map(|t| t.transfer_pct)
            .sum();
        assert!((pct_sum - 100.0).abs() <= 0.1, "sum {}", pct_sum);
    }

    #[test]
    fn test_aggregate_and_cache_summary() {
        let report = build_site_report(
            &three_run_inputs(),
            HostingFacts::unknown("ulstein.kommune.no"),
            &ReportSettings::default(),
        )
        .unwrap();

        let aggregate_total: u64 = report.summary_by_type.iter().map(|t| t.transfer_bytes).sum();
        assert_eq!(aggregate_total, 3300);
        assert_eq!(report.resources.len(), 4);

        let total = report.cache_total().unwrap();
        assert_eq!(total.total_requests, 4);
        assert_eq!(total.first_party, 3);
        assert_eq!(total.third_party, 1);
        assert!(report.data_quality.is_empty());
    }

    #[test]
    fn test_co2_rows_include_median() {
        let report = build_site_report(
            &three_run_inputs(),
            HostingFacts::unknown("ulstein.kommune.no"),
            &ReportSettings::default(),
        )
        .unwrap();

        assert_eq!(report.co2.len(), 4);
        let median_row = report.co2.last().unwrap();
        assert_eq!(median_row.iteration, Iteration::Average);
        assert_eq!(median_row.total_bytes, 1100.0);
        assert!(median_row.co2_g_one_byte > median_row.co2_g_swd);
    }

    #[test]
    fn test_recoverable_issues_recorded() {
        let inputs = SiteInputs {
            site: "vestnes.kommune.no".to_string(),
            runs: vec![
                run(1, json!({ "categories": {} }), None),
                run(
                    2,
                    report(0.5, vec![item("::bad::", "Other", 10)]),
                    Some(json!([
                        { "method": "Network.responseReceivedExtraInfo", "params": {
                            "headers": { "cache-control": "no-store" } } }
                    ])),
                ),
            ],
        };

        let report = build_site_report(
            &inputs,
            HostingFacts::unknown("vestnes.kommune.no"),
            &ReportSettings::default(),
        )
        .unwrap();

        let issues = &report.data_quality;
        assert!(issues.contains(&DataQualityIssue::MissingTraceData { run: 1 }));
        assert!(issues.contains(&DataQualityIssue::MissingNetworkLog { run: 1 }));
        assert!(issues.iter().any(|i| matches!(i, DataQualityIssue::UnresolvableHeaderEvent { run: 2, .. })));
        assert!(issues.iter().any(|i| matches!(i, DataQualityIssue::MalformedUrl { .. })));

        // The malformed URL still counts in byte totals
        let run2 = report.raw_runs().nth(1).unwrap();
        assert_eq!(run2.total_bytes, 10.0);
        assert_eq!(report.cache_total().unwrap().total_requests, 0);
    }

    #[test]
    fn test_green_hosting_lowers_co2() {
        let grey = build_site_report(
            &three_run_inputs(),
            HostingFacts::unknown("ulstein.kommune.no"),
            &ReportSettings::default(),
        )
        .unwrap();

        let mut facts = HostingFacts::unknown("ulstein.kommune.no");
        facts.green_hosted = true;
        let green = build_site_report(&three_run_inputs(), facts, &ReportSettings::default()).unwrap();

        assert!(green.average().unwrap().co2_grams < grey.average().unwrap().co2_grams);
    }

    #[test]
    fn test_no_runs_is_an_error() {
        let inputs = SiteInputs {
            site: "empty.no".to_string(),
            runs: vec![],
        };
        assert!(build_site_report(
            &inputs,
            HostingFacts::unknown("empty.no"),
            &ReportSettings::default()
        )
        .is_err());
    }

    #[test]
    fn test_single_run_with_repeated_url_stays_consistent() {
        let inputs = SiteInputs {
            site: "giske.kommune.no".to_string(),
            runs: vec![run(
                1,
                report(0.6, vec![
                    item("https://giske.kommune.no/x.js", "Script", 100),
                    item("https://giske.kommune.no/x.js", "Script", 300),
                ]),
                Some(json!([])),
            )],
        };

        let report = build_site_report(
            &inputs,
            HostingFacts::unknown("giske.kommune.no"),
            &ReportSettings::default(),
        )
        .unwrap();

        let run_total = report.raw_runs().next().unwrap().total_bytes;
        let aggregate: u64 = report.summary_by_type.iter().map(|t| t.transfer_bytes).sum();
        let representative: u64 = report
            .representative_summary_by_type
            .iter()
            .map(|t| t.transfer_bytes)
            .sum();

        assert_eq!(run_total, 400.0);
        assert_eq!(aggregate, 400);
        assert_eq!(representative, 400);
        assert_eq!(report.summary_by_type, report.representative_summary_by_type);
        assert_eq!(report.resources.len(), 1);
        assert_eq!(report.resources[0].run(1).unwrap().entry.transfer_bytes, 400);
    }
}

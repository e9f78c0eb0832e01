//! Runs a job handler over each configured domain.

use std::time::Instant;

use tracing::{debug, error, info};

use curator_core::{logging, DateRange, Result};

use crate::handler::{JobContext, JobHandler, JobReport};

/// Outcome of one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainOutcome {
    Completed(JobReport),
    /// The handler failed with a non-fatal error; later domains still ran.
    Failed(String),
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Per-domain outcomes in run order; `None` stands for all data.
    pub domains: Vec<(Option<String>, DomainOutcome)>,
    /// Counters summed over completed domains.
    pub total: JobReport,
}

impl RunSummary {
    pub fn failed_domains(&self) -> usize {
        self.domains
            .iter()
            .filter(|(_, outcome)| matches!(outcome, DomainOutcome::Failed(_)))
            .count()
    }
}

/// Runs a handler once per domain, in order.
#[derive(Debug, Clone)]
pub struct JobRunner {
    domains: Vec<Option<String>>,
    date_range: Option<DateRange>,
}

impl JobRunner {
    /// Runner over explicit domains; `None` entries mean all data.
    pub fn new(domains: Vec<Option<String>>) -> Self {
        Self {
            domains,
            date_range: None,
        }
    }

    /// Runner over a list of domain URLs.
    pub fn for_domains<S: AsRef<str>>(domains: &[S]) -> Self {
        Self::new(
            domains
                .iter()
                .map(|d| Some(d.as_ref().to_string()))
                .collect(),
        )
    }

    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    pub fn domains(&self) -> &[Option<String>] {
        &self.domains
    }

    /// Execute `handler` for every domain.
    ///
    /// A fatal error stops the run and is returned. Any other error is logged,
    /// recorded for that domain, and the run moves on.
    pub async fn run(&self, handler: &dyn JobHandler) -> Result<RunSummary> {
        let kind = handler.kind();
        let start = Instant::now();
        let mut summary = RunSummary::default();

        info!(
            subsystem = "jobs",
            component = "runner",
            { logging::JOB_KIND } = %kind,
            domains = self.domains.len(),
            date_range = ?self.date_range,
            "Job run started"
        );

        for domain in &self.domains {
            let ctx = JobContext::new(domain.as_deref())
                .with_date_range(self.date_range)
                .with_progress_callback(move |done, total, message| {
                    debug!(
                        subsystem = "jobs",
                        component = "runner",
                        { logging::JOB_KIND } = %kind,
                        done,
                        total,
                        note = ?message,
                        "Progress"
                    );
                });

            info!(
                subsystem = "jobs",
                component = "runner",
                { logging::JOB_KIND } = %kind,
                { logging::DOMAIN } = ctx.label(),
                "Processing domain"
            );
            let domain_start = Instant::now();

            match handler.execute(&ctx).await {
                Ok(report) => {
                    info!(
                        subsystem = "jobs",
                        component = "runner",
                        { logging::JOB_KIND } = %kind,
                        { logging::DOMAIN } = ctx.label(),
                        fetched = report.fetched,
                        processed = report.processed,
                        updated = report.updated,
                        deleted = report.deleted,
                        skipped = report.skipped,
                        failed = report.failed,
                        { logging::DURATION_MS } = domain_start.elapsed().as_millis() as u64,
                        "Domain complete"
                    );
                    summary.total.merge(&report);
                    summary
                        .domains
                        .push((domain.clone(), DomainOutcome::Completed(report)));
                }
                Err(e) if e.is_fatal() => {
                    error!(
                        subsystem = "jobs",
                        component = "runner",
                        { logging::JOB_KIND } = %kind,
                        { logging::DOMAIN } = ctx.label(),
                        { logging::ERROR_MSG } = %e,
                        "Fatal error, aborting run"
                    );
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        subsystem = "jobs",
                        component = "runner",
                        { logging::JOB_KIND } = %kind,
                        { logging::DOMAIN } = ctx.label(),
                        { logging::ERROR_MSG } = %e,
                        "Domain failed, continuing"
                    );
                    summary
                        .domains
                        .push((domain.clone(), DomainOutcome::Failed(e.to_string())));
                }
            }
        }

        info!(
            subsystem = "jobs",
            component = "runner",
            { logging::JOB_KIND } = %kind,
            failed_domains = summary.failed_domains(),
            { logging::DURATION_MS } = start.elapsed().as_millis() as u64,
            "Job run complete"
        );
        Ok(summary)
    }
}

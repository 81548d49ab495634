//! Build log: what each stage did and how long it took.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Build stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Cleanup,
    CopyAssets,
    BuildBundles,
    BuildViews,
}

impl Stage {
    /// One-based position in the build.
    pub fn number(self) -> usize {
        match self {
            Stage::Cleanup => 1,
            Stage::CopyAssets => 2,
            Stage::BuildBundles => 3,
            Stage::BuildViews => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Cleanup => "cleanup output",
            Stage::CopyAssets => "copy assets",
            Stage::BuildBundles => "build bundles",
            Stage::BuildViews => "build views",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

/// Elapsed time of one completed stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: Stage,

    /// Items the stage produced (files, bundles or pages)
    pub items: usize,

    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

/// A page that failed to render under the continue-on-error policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    /// Logical path of the source template
    pub page: String,
    pub error: String,
}

/// Append-only record of one build run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildLog {
    pub output_dir: PathBuf,
    pub stages: Vec<StageTiming>,
    pub failures: Vec<PageFailure>,

    #[serde(rename = "total_ms", serialize_with = "as_optional_millis")]
    pub total: Option<Duration>,
}

impl BuildLog {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            stages: Vec::new(),
            failures: Vec::new(),
            total: None,
        }
    }

    pub fn record(&mut self, stage: Stage, items: usize, elapsed: Duration) {
        self.stages.push(StageTiming {
            stage,
            items,
            elapsed,
        });
    }

    pub fn finish(&mut self, total: Duration) {
        self.total = Some(total);
    }

    /// Items produced by a stage, zero if it never completed.
    pub fn items(&self, stage: Stage) -> usize {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.items)
            .unwrap_or(0)
    }

    pub fn pages(&self) -> usize {
        self.items(Stage::BuildViews)
    }

    pub fn is_success(&self) -> bool {
        self.total.is_some() && self.failures.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for BuildLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "output: {}", self.output_dir.display())?;

        for timing in &self.stages {
            writeln!(f, "{}...", timing.stage)?;
            write!(
                f,
                "{} completed in {} ms",
                timing.stage,
                timing.elapsed.as_millis()
            )?;
            match unit(timing.stage, timing.items) {
                Some(unit) => writeln!(f, " ({} {})", timing.items, unit)?,
                None => writeln!(f)?,
            }

            if timing.stage == Stage::BuildViews {
                for failure in &self.failures {
                    writeln!(f, "   failed {}: {}", failure.page, failure.error)?;
                }
            }
        }

        if let Some(total) = self.total {
            writeln!(f, "total: {} ms", total.as_millis())?;
        }

        Ok(())
    }
}

fn unit(stage: Stage, items: usize) -> Option<&'static str> {
    let single = items == 1;
    let unit = match stage {
        Stage::Cleanup => return None,
        Stage::CopyAssets if single => "file",
        Stage::CopyAssets => "files",
        Stage::BuildBundles if single => "bundle",
        Stage::BuildBundles => "bundles",
        Stage::BuildViews if single => "page",
        Stage::BuildViews => "pages",
    };
    Some(unit)
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

fn as_optional_millis<S: Serializer>(
    duration: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match duration {
        Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> BuildLog {
        let mut log = BuildLog::new("/srv/site/output");
        log.record(Stage::Cleanup, 0, Duration::from_millis(2));
        log.record(Stage::CopyAssets, 3, Duration::from_millis(5));
        log.record(Stage::BuildBundles, 1, Duration::from_millis(1));
        log.record(Stage::BuildViews, 2, Duration::from_millis(40));
        log.finish(Duration::from_millis(48));
        log
    }

    #[test]
    fn renders_stage_lines_in_order() {
        let text = sample().to_string();

        assert_eq!(
            text,
            "output: /srv/site/output\n\
             1. cleanup output...\n\
             1. cleanup output completed in 2 ms\n\
             2. copy assets...\n\
             2. copy assets completed in 5 ms (3 files)\n\
             3. build bundles...\n\
             3. build bundles completed in 1 ms (1 bundle)\n\
             4. build views...\n\
             4. build views completed in 40 ms (2 pages)\n\
             total: 48 ms\n"
        );
    }

    #[test]
    fn lists_failures_under_views() {
        let mut log = sample();
        log.failures.push(PageFailure {
            page: "Views/Home/Broken.tmpl".to_string(),
            error: "HTTP 500".to_string(),
        });

        assert!(log
            .to_string()
            .contains("   failed Views/Home/Broken.tmpl: HTTP 500\n"));
        assert!(!log.is_success());
    }

    #[test]
    fn serializes_durations_as_millis() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();

        assert_eq!(json["total_ms"], 48);
        assert_eq!(json["stages"][3]["stage"], "build_views");
        assert_eq!(json["stages"][3]["elapsed_ms"], 40);
        assert_eq!(json["stages"][3]["items"], 2);
    }

    #[test]
    fn unfinished_log_is_not_success() {
        let mut log = BuildLog::new("out");
        log.record(Stage::Cleanup, 0, Duration::ZERO);

        assert!(!log.is_success());
        assert_eq!(log.pages(), 0);
    }
}

//! Human-readable summaries for the details, statistics and legend panels

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::color::{format_relative_date, frequency_label, hue_range, is_recent, ColorOptions};
use crate::layout::CityLayout;
use crate::model::{CityData, ClassRef};
use crate::render::is_deprecated;

/// Everything the details panel shows for one building
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingDetails {
    pub name: String,
    pub package: String,
    pub lines_of_code: u64,
    pub height: Option<f64>,
    pub commits: Option<u64>,
    pub authors: Option<u64>,
    pub frequency: Option<&'static str>,
    pub last_modified: Option<String>,
    pub recent: bool,
    pub deprecated: bool,
}

impl BuildingDetails {
    pub fn for_class(
        data: &CityData,
        layout: &CityLayout,
        class_ref: ClassRef,
        recent_days: f64,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let (package, class) = data.class(class_ref)?;
        let meta = class.git_metadata.as_ref();

        Some(Self {
            name: class.name.clone(),
            package: package.name.clone(),
            lines_of_code: class.lines_of_code,
            height: layout.building(class_ref).map(|b| b.height),
            commits: meta.map(|m| m.commits),
            authors: meta.map(|m| m.authors),
            frequency: meta.map(|m| frequency_label(m.commits).as_str()),
            last_modified: meta
                .and_then(|m| m.last_modified)
                .map(|ts| format_relative_date(ts, now)),
            recent: is_recent(meta, recent_days, now),
            deprecated: is_deprecated(&class.name),
        })
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            self.name.clone(),
            format!("Package: {}", self.package),
            format!("Lines of code: {}", self.lines_of_code),
        ];
        if let Some(height) = self.height {
            lines.push(format!("Height: {:.0}", height));
        }
        match (self.commits, self.frequency) {
            (Some(commits), Some(label)) => lines.push(format!("Commits: {} ({})", commits, label)),
            _ => lines.push("No git history".to_string()),
        }
        if let Some(authors) = self.authors {
            lines.push(format!("Authors: {}", authors));
        }
        if let Some(when) = &self.last_modified {
            lines.push(format!("Last modified: {}", when));
        }
        if self.recent {
            lines.push("Recently changed".to_string());
        }
        if self.deprecated {
            lines.push("Marked as deprecated".to_string());
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub name: String,
    pub package: String,
    pub value: u64,
}

/// Dataset-wide figures for the statistics panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityStats {
    pub packages: usize,
    pub classes: usize,
    pub total_loc: u64,
    pub average_loc: f64,
    pub largest_class: Option<ClassSummary>,
    pub most_changed: Option<ClassSummary>,
    pub with_git_data: usize,
    pub recent: usize,
    pub deprecated: usize,
}

impl CityStats {
    pub fn compute(data: &CityData, recent_days: f64, now: DateTime<Utc>) -> Self {
        let classes = data.class_count();
        let total_loc = data.total_loc();
        let mut largest: Option<ClassSummary> = None;
        let mut most_changed: Option<ClassSummary> = None;
        let (mut with_git_data, mut recent, mut deprecated) = (0, 0, 0);

        for (_, package, class) in data.classes() {
            if largest.as_ref().map_or(true, |l| class.lines_of_code > l.value) {
                largest = Some(ClassSummary {
                    name: class.name.clone(),
                    package: package.name.clone(),
                    value: class.lines_of_code,
                });
            }
            if let Some(meta) = &class.git_metadata {
                with_git_data += 1;
                if most_changed.as_ref().map_or(true, |m| meta.commits > m.value) {
                    most_changed = Some(ClassSummary {
                        name: class.name.clone(),
                        package: package.name.clone(),
                        value: meta.commits,
                    });
                }
            }
            if is_recent(class.git_metadata.as_ref(), recent_days, now) {
                recent += 1;
            }
            if is_deprecated(&class.name) {
                deprecated += 1;
            }
        }

        Self {
            packages: data.packages.len(),
            classes,
            total_loc,
            average_loc: if classes == 0 { 0.0 } else { total_loc as f64 / classes as f64 },
            largest_class: largest,
            most_changed,
            with_git_data,
            recent,
            deprecated,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Packages: {}", self.packages),
            format!("Classes: {}", self.classes),
            format!("Total lines: {}", self.total_loc),
            format!("Average lines per class: {:.1}", self.average_loc),
        ];
        if let Some(largest) = &self.largest_class {
            lines.push(format!(
                "Largest: {}.{} ({} lines)",
                largest.package, largest.name, largest.value
            ));
        }
        if let Some(changed) = &self.most_changed {
            lines.push(format!(
                "Most changed: {}.{} ({} commits)",
                changed.package, changed.name, changed.value
            ));
        }
        lines.push(format!("With git history: {}", self.with_git_data));
        lines.push(format!("Recently changed: {}", self.recent));
        lines.push(format!("Deprecated: {}", self.deprecated));
        lines
    }
}

/// Legend text for the active toggles
pub fn legend(options: ColorOptions) -> Vec<String> {
    let mut lines = Vec::new();
    if options.frequency {
        let (quiet, hot) = hue_range(options.color_blind);
        let palette = if options.color_blind { "purple → orange" } else { "blue → red" };
        lines.push(format!(
            "Hue: change frequency, {} (hue {} → {})",
            palette, quiet, hot
        ));
    } else {
        lines.push("Hue: frequency coloring off".to_string());
    }
    if options.age {
        lines.push("Saturation: vivid = recently modified, faded = a year or older".to_string());
    } else {
        lines.push("Saturation: age coloring off".to_string());
    }
    lines.push("Height: lines of code".to_string());
    lines.push("Dashed outline: deprecated or legacy name".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::LayoutStrategy;
    use crate::model::parse_timestamp;

    fn now() -> DateTime<Utc> {
        parse_timestamp("2025-06-15T12:00:00Z").unwrap()
    }

    fn data() -> CityData {
        CityData::from_json_str(
            r#"{"packages":[
                {"name":"core","classes":[
                    {"name":"Engine","linesOfCode":400,"gitMetadata":{"commits":60,"authors":4,"lastModified":"2025-06-13T12:00:00Z"}},
                    {"name":"LegacyParser","linesOfCode":90,"gitMetadata":{"commits":1,"authors":1,"lastModified":"2023-01-01T00:00:00Z"}}
                ]},
                {"name":"util","classes":[{"name":"Strings","linesOfCode":20}]}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_details_for_class_with_history() {
        let data = data();
        let layout = CityLayout::compute(&data, LayoutStrategy::Quadrant, &LayoutConfig::default());
        let details = BuildingDetails::for_class(&data, &layout, ClassRef::new(0, 0), 7.0, now()).unwrap();

        assert_eq!(details.package, "core");
        assert_eq!(details.frequency, Some("Very high activity"));
        assert_eq!(details.last_modified.as_deref(), Some("2 days ago"));
        assert!(details.recent);
        assert!(!details.deprecated);
        assert_eq!(details.height, Some(320.0));
        let lines = details.lines();
        assert!(lines.contains(&"Commits: 60 (Very high activity)".to_string()));
        assert!(lines.contains(&"Recently changed".to_string()));
    }

    #[test]
    fn test_details_without_history() {
        let data = data();
        let layout = CityLayout::compute(&data, LayoutStrategy::Grid, &LayoutConfig::default());
        let details = BuildingDetails::for_class(&data, &layout, ClassRef::new(1, 0), 7.0, now()).unwrap();
        assert_eq!(details.commits, None);
        assert!(details.lines().contains(&"No git history".to_string()));
        assert!(BuildingDetails::for_class(&data, &layout, ClassRef::new(5, 0), 7.0, now()).is_none());
    }

    #[test]
    fn test_stats() {
        let stats = CityStats::compute(&data(), 7.0, now());
        assert_eq!(stats.packages, 2);
        assert_eq!(stats.classes, 3);
        assert_eq!(stats.total_loc, 510);
        assert!((stats.average_loc - 170.0).abs() < 1e-9);
        assert_eq!(stats.largest_class.as_ref().unwrap().name, "Engine");
        assert_eq!(stats.most_changed.as_ref().unwrap().value, 60);
        assert_eq!(stats.with_git_data, 2);
        assert_eq!(stats.recent, 1);
        assert_eq!(stats.deprecated, 1);
        assert!(stats.lines().iter().any(|l| l == "Largest: core.Engine (400 lines)"));
    }

    #[test]
    fn test_stats_on_empty_dataset() {
        let stats = CityStats::compute(&CityData::default(), 7.0, now());
        assert_eq!(stats.average_loc, 0.0);
        assert!(stats.largest_class.is_none());
    }

    #[test]
    fn test_legend_follows_palette() {
        let lines = legend(ColorOptions { color_blind: true, ..Default::default() });
        assert!(lines[0].contains("purple"));
        assert!(lines[0].contains("270 → 30"));
    }
}

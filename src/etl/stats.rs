use std::collections::HashMap;

use log::info;

use crate::data::railway::RailwayExtraction;

#[derive(Debug, Clone, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    fn of(mut values: impl Iterator<Item = f64>) -> Option<Extent> {
        let first = values.next()?;
        Some(values.fold(Extent { min: first, max: first }, |extent, value| Extent {
            min: extent.min.min(value),
            max: extent.max.max(value),
        }))
    }
}

/// Run summary: counts, railway types and the area covered by the points.
#[derive(Debug, Clone, PartialEq)]
pub struct RailwayStats {
    pub total_railways: usize,
    pub total_points: usize,
    /// Most frequent type first, ties broken by type name.
    pub railway_types: Vec<(String, usize)>,
    pub lat: Option<Extent>,
    pub lon: Option<Extent>,
}

impl RailwayStats {
    pub fn compute(extraction: &RailwayExtraction) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for railway in &extraction.railways {
            *counts.entry(railway.railway_type.as_str()).or_insert(0) += 1;
        }
        let mut railway_types: Vec<(String, usize)> = counts.into_iter()
            .map(|(railway_type, count)| (railway_type.to_string(), count))
            .collect();
        railway_types.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        RailwayStats {
            total_railways: extraction.railways.len(),
            total_points: extraction.points.len(),
            railway_types,
            lat: Extent::of(extraction.points.iter().map(|p| p.lat)),
            lon: Extent::of(extraction.points.iter().map(|p| p.lon)),
        }
    }

    pub fn log(&self) {
        info!(total_railways = self.total_railways, total_points = self.total_points; "Railway statistics");
        for (railway_type, count) in &self.railway_types {
            info!(railway_type = railway_type.as_str(), count = *count; "Railway type distribution");
        }
        if let (Some(lat), Some(lon)) = (&self.lat, &self.lon) {
            info!(
                min_lat = lat.min, max_lat = lat.max, min_lon = lon.min, max_lon = lon.max;
                "Geographic extent"
            );
        }
    }
}

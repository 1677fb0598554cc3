//! Sales performance and price trend figures for the dashboard.
//!
//! Everything here is a pure function over data the routes have already
//! fetched from the backend.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Property, PropertyStatus, Reservation, ReservationStatus};

/// Mean of `values`, None when empty
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Percentage change from `old` to `new`, None when `old` is zero
pub fn percent_change(old: f64, new: f64) -> Option<f64> {
    if old == 0.0 {
        return None;
    }
    Some((new - old) / old * 100.0)
}

/// Trailing moving average with one output per input.
///
/// The first `window - 1` points average whatever prefix is available.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut sum = 0.0;

    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            sum += value;
            if i >= window {
                sum -= values[i - window];
            }
            sum / (i + 1).min(window) as f64
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub recorded_at: DateTime<Utc>,
    pub price: i64,
    pub smoothed: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceTrend {
    pub property_id: i64,
    pub current_price: Option<i64>,
    /// First recorded price against the current one
    pub change_percent: Option<f64>,
    pub points: Vec<TrendPoint>,
}

pub fn price_trend(property: &Property, window: usize) -> PriceTrend {
    let history = property.sorted_history();
    let prices: Vec<f64> = history.iter().map(|entry| entry.price as f64).collect();
    let smoothed = moving_average(&prices, window);

    let change_percent = match (prices.first(), prices.last()) {
        (Some(&first), Some(&last)) if prices.len() > 1 => percent_change(first, last),
        _ => None,
    };

    PriceTrend {
        property_id: property.id,
        current_price: property.current_price(),
        change_percent,
        points: history
            .into_iter()
            .zip(smoothed)
            .map(|(entry, smoothed)| TrendPoint {
                recorded_at: entry.recorded_at,
                price: entry.price,
                smoothed,
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationCounts {
    pub active: usize,
    pub sold: usize,
    pub cancelled: usize,
    pub expired: usize,
}

impl ReservationCounts {
    fn record(&mut self, status: ReservationStatus) {
        match status {
            ReservationStatus::Active => self.active += 1,
            ReservationStatus::Sold => self.sold += 1,
            ReservationStatus::Cancelled => self.cancelled += 1,
            ReservationStatus::Expired => self.expired += 1,
        }
    }

    fn finished(&self) -> usize {
        self.sold + self.cancelled + self.expired
    }

    /// Share of finished reservations that ended in a sale
    fn conversion_rate(&self) -> Option<f64> {
        match self.finished() {
            0 => None,
            finished => Some(self.sold as f64 / finished as f64 * 100.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformance {
    pub agent_id: i64,
    pub reservations: ReservationCounts,
    pub sales_volume: i64,
    pub conversion_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub listed: usize,
    pub available: usize,
    pub reserved: usize,
    pub sold_listings: usize,
    pub reservations: ReservationCounts,
    pub sales_volume: i64,
    pub average_sale_price: Option<f64>,
    pub average_listing_price: Option<f64>,
    pub conversion_rate: Option<f64>,
    /// Sorted by sales volume, highest first
    pub agents: Vec<AgentPerformance>,
}

/// Sum that pins at `i64::MAX` instead of overflowing on outsized backend values
fn saturating_total(amounts: &[i64]) -> i64 {
    amounts.iter().fold(0i64, |total, &amount| total.saturating_add(amount))
}

/// Sale amount for a sold reservation, falling back to the listing's current price
fn sale_amount(reservation: &Reservation, prices: &HashMap<i64, i64>) -> Option<i64> {
    reservation
        .sale_price
        .or_else(|| prices.get(&reservation.property_id).copied())
}

pub fn performance(
    properties: &[Property],
    reservations: &[Reservation],
    now: DateTime<Utc>,
) -> PerformanceSummary {
    let prices: HashMap<i64, i64> = properties
        .iter()
        .filter_map(|p| p.current_price().map(|price| (p.id, price)))
        .collect();

    let count_status = |status: PropertyStatus| properties.iter().filter(|p| p.status == status).count();

    let mut counts = ReservationCounts::default();
    let mut sales = Vec::new();
    let mut agents: HashMap<i64, AgentPerformance> = HashMap::new();

    for reservation in reservations {
        let status = reservation.effective_status(now);
        counts.record(status);

        let agent = agents
            .entry(reservation.agent_id)
            .or_insert_with(|| AgentPerformance {
                agent_id: reservation.agent_id,
                reservations: ReservationCounts::default(),
                sales_volume: 0,
                conversion_rate: None,
            });
        agent.reservations.record(status);

        if status == ReservationStatus::Sold {
            if let Some(amount) = sale_amount(reservation, &prices) {
                agent.sales_volume = agent.sales_volume.saturating_add(amount);
                sales.push(amount);
            }
        }
    }

    let mut agents: Vec<AgentPerformance> = agents
        .into_values()
        .map(|mut agent| {
            agent.conversion_rate = agent.reservations.conversion_rate();
            agent
        })
        .collect();
    agents.sort_by(|a, b| {
        b.sales_volume
            .cmp(&a.sales_volume)
            .then(a.agent_id.cmp(&b.agent_id))
    });

    let listing_prices: Vec<f64> = prices.values().map(|&p| p as f64).collect();
    let sale_prices: Vec<f64> = sales.iter().map(|&p| p as f64).collect();

    PerformanceSummary {
        listed: properties.len(),
        available: count_status(PropertyStatus::Available),
        reserved: count_status(PropertyStatus::Reserved),
        sold_listings: count_status(PropertyStatus::Sold),
        sales_volume: saturating_total(&sales),
        average_sale_price: average(&sale_prices),
        average_listing_price: average(&listing_prices),
        conversion_rate: counts.conversion_rate(),
        reservations: counts,
        agents,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySales {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
    pub volume: i64,
    /// Volume against the previous month that had sales
    pub change_percent: Option<f64>,
}

/// Sold reservations grouped by calendar month, oldest first
pub fn monthly_sales(properties: &[Property], reservations: &[Reservation]) -> Vec<MonthlySales> {
    let prices: HashMap<i64, i64> = properties
        .iter()
        .filter_map(|p| p.current_price().map(|price| (p.id, price)))
        .collect();

    let mut months: BTreeMap<String, (usize, i64)> = BTreeMap::new();
    for reservation in reservations {
        let Some(date) = reservation.sale_date() else {
            continue;
        };
        let bucket = months.entry(date.format("%Y-%m").to_string()).or_default();
        bucket.0 += 1;
        bucket.1 = bucket.1.saturating_add(sale_amount(reservation, &prices).unwrap_or(0));
    }

    let mut previous: Option<i64> = None;
    months
        .into_iter()
        .map(|(month, (count, volume))| {
            let change_percent = previous.and_then(|prev| percent_change(prev as f64, volume as f64));
            previous = Some(volume);
            MonthlySales {
                month,
                count,
                volume,
                change_percent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, PriceEntry};
    use chrono::TimeZone;

    fn ts(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 9, 0, 0).unwrap()
    }

    fn property(id: i64, status: PropertyStatus, prices: &[(u32, i64)]) -> Property {
        Property {
            id,
            title: format!("Listing {id}"),
            description: String::new(),
            location: Location {
                address: format!("Folkungagatan {id}"),
                city: "Stockholm".to_string(),
                area: None,
                latitude: None,
                longitude: None,
            },
            bedrooms: 2,
            bathrooms: 1.0,
            area_sqm: 50.0,
            property_type: "apartment".to_string(),
            status,
            price_history: prices
                .iter()
                .map(|&(month, price)| PriceEntry { price, recorded_at: ts(month, 1) })
                .collect(),
            images: vec![],
            broker_id: Some(1),
            created_at: ts(1, 1),
        }
    }

    fn reservation(
        id: i64,
        property_id: i64,
        agent_id: i64,
        status: ReservationStatus,
        ends_at: DateTime<Utc>,
        sale_price: Option<i64>,
    ) -> Reservation {
        Reservation {
            id,
            property_id,
            agent_id,
            client_name: format!("Client {id}"),
            client_email: None,
            starts_at: ts(1, 1),
            ends_at,
            status,
            sale_price,
            sold_at: None,
            created_at: ts(1, 1),
        }
    }

    #[test]
    fn averages_and_changes_handle_degenerate_input() {
        assert_eq!(average(&[]), None);
        assert_eq!(average(&[2.0, 4.0]), Some(3.0));
        assert_eq!(percent_change(0.0, 10.0), None);
        assert_eq!(percent_change(200.0, 150.0), Some(-25.0));
    }

    #[test]
    fn moving_average_uses_available_prefix() {
        assert_eq!(
            moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3),
            vec![1.0, 1.5, 2.0, 3.0, 4.0]
        );
        assert_eq!(moving_average(&[4.0, 8.0], 0), vec![4.0, 8.0]);
        assert!(moving_average(&[], 3).is_empty());
    }

    #[test]
    fn trend_sorts_history_before_smoothing() {
        let p = property(1, PropertyStatus::Available, &[(3, 300), (1, 100), (2, 200)]);
        let trend = price_trend(&p, 2);

        let prices: Vec<i64> = trend.points.iter().map(|point| point.price).collect();
        assert_eq!(prices, vec![100, 200, 300]);
        assert_eq!(trend.points[2].smoothed, 250.0);
        assert_eq!(trend.current_price, Some(300));
        assert_eq!(trend.change_percent, Some(200.0));
    }

    #[test]
    fn single_entry_trend_has_no_change() {
        let p = property(1, PropertyStatus::Available, &[(1, 100)]);
        assert_eq!(price_trend(&p, 3).change_percent, None);
    }

    #[test]
    fn performance_counts_lapsed_holds_and_ranks_agents() {
        let now = ts(6, 1);
        let properties = vec![
            property(1, PropertyStatus::Sold, &[(1, 1_000_000)]),
            property(2, PropertyStatus::Sold, &[(1, 2_000_000)]),
            property(3, PropertyStatus::Available, &[(1, 3_000_000)]),
        ];
        let reservations = vec![
            reservation(1, 1, 10, ReservationStatus::Sold, ts(2, 1), Some(1_100_000)),
            reservation(2, 2, 20, ReservationStatus::Sold, ts(3, 1), None),
            reservation(3, 3, 10, ReservationStatus::Active, ts(4, 1), None),
            reservation(4, 3, 20, ReservationStatus::Cancelled, ts(4, 1), None),
            reservation(5, 3, 10, ReservationStatus::Active, ts(7, 1), None),
        ];

        let summary = performance(&properties, &reservations, now);

        assert_eq!(summary.listed, 3);
        assert_eq!(summary.sold_listings, 2);
        assert_eq!(
            summary.reservations,
            ReservationCounts { active: 1, sold: 2, cancelled: 1, expired: 1 }
        );
        assert_eq!(summary.sales_volume, 3_100_000);
        assert_eq!(summary.average_sale_price, Some(1_550_000.0));
        assert_eq!(summary.conversion_rate, Some(50.0));

        assert_eq!(summary.agents[0].agent_id, 20);
        assert_eq!(summary.agents[0].sales_volume, 2_000_000);
        assert_eq!(summary.agents[1].conversion_rate, Some(50.0));
    }

    #[test]
    fn outsized_sale_prices_saturate() {
        let now = ts(6, 1);
        let reservations = vec![
            reservation(1, 1, 10, ReservationStatus::Sold, ts(2, 1), Some(i64::MAX)),
            reservation(2, 1, 10, ReservationStatus::Sold, ts(2, 5), Some(1_000)),
        ];

        let summary = performance(&[], &reservations, now);
        assert_eq!(summary.sales_volume, i64::MAX);
        assert_eq!(summary.agents[0].sales_volume, i64::MAX);

        let months = monthly_sales(&[], &reservations);
        assert_eq!(months[0].volume, i64::MAX);
    }

    #[test]
    fn empty_performance_has_no_rates() {
        let summary = performance(&[], &[], ts(1, 1));
        assert_eq!(summary.conversion_rate, None);
        assert_eq!(summary.average_sale_price, None);
        assert!(summary.agents.is_empty());
    }

    #[test]
    fn monthly_sales_compare_against_previous_month() {
        let properties = vec![property(1, PropertyStatus::Sold, &[(1, 500)])];
        let reservations = vec![
            reservation(1, 1, 10, ReservationStatus::Sold, ts(3, 10), Some(1_000)),
            reservation(2, 1, 10, ReservationStatus::Sold, ts(2, 10), Some(400)),
            reservation(3, 1, 10, ReservationStatus::Sold, ts(3, 20), None),
            reservation(4, 1, 10, ReservationStatus::Cancelled, ts(3, 20), Some(9_999)),
        ];

        let months = monthly_sales(&properties, &reservations);

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2024-02");
        assert_eq!(months[0].change_percent, None);
        assert_eq!(months[1].month, "2024-03");
        assert_eq!(months[1].count, 2);
        assert_eq!(months[1].volume, 1_500);
        assert_eq!(months[1].change_percent, Some(275.0));
    }
}

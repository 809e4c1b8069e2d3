use crate::bidders::{BidderType, Bidders};
use crate::clicks::ClickCurve;
use crate::logger::Logger;
use crate::simulationrun::{AuctionSetup, Marketplace, SimulationRun};
use plotters::prelude::*;
use std::fs;

const SERIES_COLORS: [RGBColor; 6] = [BLUE, RED, GREEN, MAGENTA, CYAN, BLACK];

/// Main function to generate all charts into charts/
pub fn generate_all_charts() -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all("charts")?;

    generate_click_curve_chart(&ClickCurve::new(), 3)?;

    for (bidder_type, name) in [
        (BidderType::HHAW_BUDGET, "hhaw"),
        (BidderType::SCTW_BUDGET, "sctw"),
        (BidderType::BALANCED, "balanced"),
    ] {
        let mut marketplace = prepare_marketplace(bidder_type);
        let simulation_run = SimulationRun::new(&mut marketplace, &mut Logger::new());
        if simulation_run.history.is_empty() {
            return Err(format!("No rounds played for the {} chart", name).into());
        }
        generate_bid_trajectory_chart(&marketplace, &simulation_run, name)?;
        generate_spend_chart(&marketplace, &simulation_run, name)?;
    }

    Ok(())
}

/// Three budget constrained bidders of the given type against two truthful bidders
fn prepare_marketplace(bidder_type: BidderType) -> Marketplace {
    let mut bidders = Bidders::new();
    bidders.add("Value 40".to_string(), bidder_type.clone(), 40.0, 6000.0);
    bidders.add("Value 32".to_string(), bidder_type.clone(), 32.0, 4000.0);
    bidders.add("Value 25".to_string(), bidder_type, 25.0, 3000.0);
    bidders.add("Truthful 20".to_string(), BidderType::TRUTHFUL, 20.0, 1.0e6);
    bidders.add("Truthful 12".to_string(), BidderType::TRUTHFUL, 12.0, 1.0e6);
    Marketplace::new(bidders, AuctionSetup::new(3, 2.0))
}

/// Clicks per slot over the day
fn generate_click_curve_chart(curve: &ClickCurve, num_slots: usize) -> Result<(), Box<dyn std::error::Error>> {
    let filepath = "charts/click_curve.png";
    let rounds: Vec<usize> = (1..=curve.rounds_per_day).collect();
    let max_clicks = curve.top_slot_clicks(1).max(1.0) * 1.1;

    let root = BitMapBackend::new(filepath, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Clicks per Slot", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(1f64..curve.rounds_per_day as f64, 0f64..max_clicks)?;

    chart.configure_mesh()
        .x_desc("Round")
        .y_desc("Clicks")
        .draw()?;

    for slot in 0..num_slots {
        let color = SERIES_COLORS[slot % SERIES_COLORS.len()];
        chart.draw_series(LineSeries::new(
            rounds.iter().map(|&t| (t as f64, curve.slot_clicks(t, num_slots)[slot])),
            &color,
        ))?
        .label(format!("Slot {}", slot))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    println!("Generated: {}", filepath);
    Ok(())
}

/// Bid of every bidder per round
fn generate_bid_trajectory_chart(marketplace: &Marketplace, simulation_run: &SimulationRun, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filepath = format!("charts/bids_{}.png", name);
    let max_value = marketplace
        .bidders
        .bidders
        .iter()
        .map(|bidder| bidder.value())
        .fold(1.0, f64::max);

    let series: Vec<Vec<(f64, f64)>> = marketplace
        .bidders
        .bidders
        .iter()
        .map(|bidder| {
            simulation_run
                .history
                .iter()
                .enumerate()
                .map(|(index, round)| ((index + 1) as f64, round.bid_of(bidder.bidder_id()).unwrap_or(0.0)))
                .collect()
        })
        .collect();

    draw_per_bidder_lines(
        marketplace,
        &series,
        &filepath,
        &format!("Bids per Round ({})", name),
        "Bid",
        simulation_run.history.len(),
        max_value * 1.1,
    )
}

/// Cumulative spend of every bidder per round
fn generate_spend_chart(marketplace: &Marketplace, simulation_run: &SimulationRun, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filepath = format!("charts/spend_{}.png", name);

    let series: Vec<Vec<(f64, f64)>> = marketplace
        .bidders
        .bidders
        .iter()
        .map(|bidder| {
            let mut cumulative = 0.0;
            simulation_run
                .history
                .iter()
                .enumerate()
                .map(|(index, round)| {
                    cumulative += round.payment_of(bidder.bidder_id());
                    ((index + 1) as f64, cumulative)
                })
                .collect()
        })
        .collect();
    let max_spend = series
        .iter()
        .filter_map(|points| points.last().map(|&(_, spend)| spend))
        .fold(1.0, f64::max);

    draw_per_bidder_lines(
        marketplace,
        &series,
        &filepath,
        &format!("Cumulative Spend ({})", name),
        "Spend",
        simulation_run.history.len(),
        max_spend * 1.1,
    )
}

fn draw_per_bidder_lines(
    marketplace: &Marketplace,
    series: &[Vec<(f64, f64)>],
    filepath: &str,
    title: &str,
    y_label: &str,
    num_rounds: usize,
    y_max: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(filepath, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1f64..num_rounds.max(2) as f64, 0f64..y_max)?;

    chart.configure_mesh()
        .x_desc("Round")
        .y_desc(y_label)
        .draw()?;

    for (index, (points, bidder)) in series.iter().zip(marketplace.bidders.bidders.iter()).enumerate() {
        let color = SERIES_COLORS[index % SERIES_COLORS.len()];
        chart.draw_series(LineSeries::new(points.iter().copied(), &color))?
            .label(bidder.bidder_name().to_string())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    println!("Generated: {}", filepath);
    Ok(())
}

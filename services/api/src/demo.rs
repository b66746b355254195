use crate::infra::{parse_date, parse_floor};
use chrono::{Duration, Local, NaiveDate};
use clap::{Args, ValueEnum};
use quote_optimizer::config::AppConfig;
use quote_optimizer::error::AppError;
use quote_optimizer::quoting::{
    AttributeValue, Offer, ProductType, QuoteDecision, QuoteEngine, QuoteError, RankedTable, Rfq,
    SelectionConstraints,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Args, Debug)]
pub(crate) struct SelectArgs {
    /// RFQ record as JSON
    #[arg(long)]
    pub(crate) rfq: PathBuf,
    /// JSON array of supplier offers
    #[arg(long)]
    pub(crate) offers: PathBuf,
    /// Minimum acceptable margin (fraction). Defaults to QUOTE_MARGIN_FLOOR.
    #[arg(long, value_parser = parse_floor)]
    pub(crate) margin_floor: Option<f64>,
    /// Order date (YYYY-MM-DD). Enables the delivery-window check against the RFQ deadline.
    #[arg(long, value_parser = parse_date)]
    pub(crate) order_date: Option<NaiveDate>,
    /// Model artifact to load instead of QUOTE_MODEL_PATH
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) format: OutputFormat,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Minimum acceptable margin (fraction). Defaults to QUOTE_MARGIN_FLOOR.
    #[arg(long, value_parser = parse_floor)]
    pub(crate) margin_floor: Option<f64>,
    /// Model artifact to load instead of QUOTE_MODEL_PATH
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

pub(crate) fn run_select(args: SelectArgs) -> Result<(), AppError> {
    let SelectArgs {
        rfq,
        offers,
        margin_floor,
        order_date,
        model,
        format,
    } = args;

    let config = AppConfig::load()?;
    let engine = load_engine(model.as_deref(), &config)?;
    let rfq: Rfq = read_json(&rfq)?;
    let offers: Vec<Offer> = read_json(&offers)?;

    let margin_floor = margin_floor.unwrap_or(config.quoting.default_margin_floor);
    let constraints = SelectionConstraints::for_rfq(&rfq, margin_floor, order_date);

    match engine.select_best_offer(&rfq, &offers, &constraints) {
        Ok(decision) => render_decision(&decision, format),
        Err(QuoteError::NoFeasibleOffer { source, ranked }) => {
            render_ranking(&ranked, format)?;
            Err(AppError::Quote(QuoteError::NoFeasibleOffer { source, ranked }))
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        margin_floor,
        model,
    } = args;

    let config = AppConfig::load()?;
    let engine = load_engine(model.as_deref(), &config)?;
    let today = Local::now().date_naive();
    let rfq = mock_rfq(today);
    let offers = mock_offers();
    let margin_floor = margin_floor.unwrap_or(config.quoting.default_margin_floor);

    println!("Quote optimizer demo (model {})", engine.model_version());
    println!(
        "RFQ {} | {} x {} | region {} | deliver by {}",
        rfq.client_id, rfq.quantity, rfq.product_type, rfq.region, rfq.deadline
    );
    println!(
        "{} supplier offers | margin floor {:.0}% | ordering {}",
        offers.len(),
        margin_floor * 100.0,
        today
    );

    let constraints = SelectionConstraints::for_rfq(&rfq, margin_floor, Some(today));
    match engine.select_best_offer(&rfq, &offers, &constraints) {
        Ok(decision) => {
            println!();
            render_decision(&decision, OutputFormat::Table)?;
            println!("\nWhy this offer?");
            println!(
                "- Highest expected value: p(win) {:.0}% x margin {:.0}%",
                decision.selected.p_win() * 100.0,
                decision.selected.margin() * 100.0
            );
            println!(
                "- Meets the margin floor of {:.0}% and the delivery deadline",
                margin_floor * 100.0
            );
            println!("- Alternatives have lower expected value or fail a constraint");
            Ok(())
        }
        Err(QuoteError::NoFeasibleOffer { source, ranked }) => {
            println!("\nNo offer can be selected: {source}");
            println!("Lower the margin floor or request more offers.\n");
            print_table(&ranked);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn load_engine(model: Option<&Path>, config: &AppConfig) -> Result<QuoteEngine, AppError> {
    let path = model.unwrap_or(config.quoting.model_path.as_path());
    Ok(QuoteEngine::load(path)?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn render_decision(decision: &QuoteDecision, format: OutputFormat) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(decision)?);
            Ok(())
        }
        OutputFormat::Csv => decision
            .ranked
            .write_csv(std::io::stdout().lock())
            .map_err(AppError::from),
        OutputFormat::Table => {
            print_table(&decision.ranked);
            println!(
                "\nSelected supplier {} | p(win) {:.0}% | margin {:.0}% | expected value {:.4}",
                decision.selected.supplier_id(),
                decision.selected.p_win() * 100.0,
                decision.selected.margin() * 100.0,
                decision.selected.objective_value()
            );
            Ok(())
        }
    }
}

fn render_ranking(ranked: &RankedTable, format: OutputFormat) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(ranked)?),
        OutputFormat::Csv => ranked.write_csv(std::io::stdout().lock())?,
        OutputFormat::Table => print_table(ranked),
    }
    Ok(())
}

fn print_table(ranked: &RankedTable) {
    println!(
        "{:>4}  {:<12} {:>8} {:>9} {:>8} {:>8} {:>9}",
        "Rank", "Supplier", "€/unit", "Lead (d)", "Margin", "p(win)", "Utility"
    );
    for row in ranked.rows() {
        println!(
            "{:>4}  {:<12} {:>8.2} {:>9} {:>7.1}% {:>7.1}% {:>9.4}{}",
            row.rank,
            row.supplier_id,
            row.unit_price,
            row.lead_time_days,
            row.margin * 100.0,
            row.p_win * 100.0,
            row.objective_value,
            if row.is_selected { "  <- selected" } else { "" }
        );
    }
}

fn mock_rfq(today: NaiveDate) -> Rfq {
    Rfq {
        client_id: "C-417".to_string(),
        region: "NL".to_string(),
        product_type: ProductType::Flyer,
        quantity: 1500,
        deadline: today + Duration::days(14),
    }
}

fn mock_offers() -> Vec<Offer> {
    const BASE_PRICE: f64 = 1.45;
    const PRICE_FACTORS: [f64; 6] = [0.94, 1.02, 1.11, 0.97, 1.06, 0.91];
    const LEADS: [u32; 6] = [6, 4, 9, 7, 5, 10];
    const MARGINS: [f64; 6] = [0.21, 0.18, 0.29, 0.24, 0.26, 0.19];
    const TIERS: [&str; 6] = ["B", "A", "C", "A", "B", "C"];
    const ON_TIME: [f64; 6] = [0.93, 0.97, 0.89, 0.95, 0.91, 0.88];

    (0..6)
        .map(|idx| {
            let unit_price = (BASE_PRICE * PRICE_FACTORS[idx] * 100.0).round() / 100.0;
            Offer::new(
                format!("S-{:02}", 3 + idx * 4),
                unit_price,
                MARGINS[idx],
                LEADS[idx],
            )
            .with_attribute("tier", AttributeValue::Text(TIERS[idx].to_string()))
            .with_attribute("on_time_rate", AttributeValue::Number(ON_TIME[idx]))
        })
        .collect()
}

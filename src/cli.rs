use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::api::{build_compare_response, build_simulate_response, run_http_server};
use crate::core::{Debt, DebtId, Strategy, compare, simulate};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliStrategy {
    Avalanche,
    Snowball,
}

impl From<CliStrategy> for Strategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Avalanche => Strategy::Avalanche,
            CliStrategy::Snowball => Strategy::Snowball,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "payoff",
    about = "Debt payoff planner (avalanche vs snowball amortization)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Simulate a plan and print it as JSON
    Plan(PlanArgs),
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[arg(
        long = "debt",
        value_name = "NAME:BALANCE:RATE:MIN",
        value_parser = parse_debt_spec,
        required = true,
        help = "Debt as name:balance:annual-rate-percent:min-payment, e.g. Card:5000:18.99:150"
    )]
    pub debts: Vec<DebtSpec>,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Monthly budget on top of all minimum payments"
    )]
    pub extra_payment: f64,
    #[arg(
        long,
        value_enum,
        help = "Simulate one strategy only; omit to compare both"
    )]
    pub strategy: Option<CliStrategy>,
    #[arg(long, default_value_t = false, help = "Pretty-print the JSON output")]
    pub pretty: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DebtSpec {
    pub name: String,
    pub balance: f64,
    pub interest_rate: f64,
    pub min_payment: f64,
}

/// Parses `name:balance:rate:min`. The name is everything before the last
/// three fields, so it may itself contain `:`.
fn parse_debt_spec(raw: &str) -> Result<DebtSpec, String> {
    let mut parts = raw.rsplitn(4, ':');
    let (Some(min), Some(rate), Some(balance), Some(name)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected NAME:BALANCE:RATE:MIN, got {raw:?}"));
    };

    let number = |label: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid {label} {value:?}: {e}"))
    };

    let name = name.trim();
    if name.is_empty() {
        return Err("debt name must not be empty".to_string());
    }

    Ok(DebtSpec {
        name: name.to_string(),
        balance: number("balance", balance)?,
        interest_rate: number("rate", rate)?,
        min_payment: number("min payment", min)?,
    })
}

impl PlanArgs {
    fn debts(&self) -> Vec<Debt> {
        self.debts
            .iter()
            .enumerate()
            .map(|(idx, spec)| {
                Debt::new(
                    DebtId(idx as u32 + 1),
                    spec.name.clone(),
                    spec.balance,
                    spec.interest_rate,
                    spec.min_payment,
                )
            })
            .collect()
    }
}

pub fn plan_output(args: &PlanArgs) -> Result<String, String> {
    let debts = args.debts();
    let value = match args.strategy {
        Some(strategy) => {
            let result =
                simulate(&debts, args.extra_payment, strategy.into()).map_err(|e| e.to_string())?;
            serde_json::to_value(build_simulate_response(result))
        }
        None => {
            let comparison = compare(&debts, args.extra_payment).map_err(|e| e.to_string())?;
            serde_json::to_value(build_compare_response(comparison))
        }
    }
    .map_err(|e| format!("failed to encode plan: {e}"))?;

    let encoded = if args.pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    encoded.map_err(|e| format!("failed to encode plan: {e}"))
}

pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Serve { port } => run_http_server(port)
            .await
            .map_err(|e| format!("server error: {e}")),
        Command::Plan(args) => {
            info!(debts = args.debts.len(), extra = args.extra_payment, "running plan");
            println!("{}", plan_output(&args)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).expect("arguments should parse")
    }

    fn plan_args(cli: Cli) -> PlanArgs {
        match cli.command {
            Command::Plan(args) => args,
            other => panic!("expected plan command, got {other:?}"),
        }
    }

    #[test]
    fn parse_debt_spec_allows_colons_in_name() {
        let spec = parse_debt_spec("Card: Visa:5000:18.99:150").expect("valid spec");
        assert_eq!(spec.name, "Card: Visa");
        assert_eq!(spec.balance, 5_000.0);
        assert_eq!(spec.interest_rate, 18.99);
        assert_eq!(spec.min_payment, 150.0);
    }

    #[test]
    fn parse_debt_spec_rejects_malformed_values() {
        assert!(parse_debt_spec("Card:5000:18.99").is_err());
        assert!(parse_debt_spec(":5000:18.99:150").is_err());
        let err = parse_debt_spec("Card:lots:18.99:150").expect_err("bad balance");
        assert!(err.contains("balance"));
    }

    #[test]
    fn serve_defaults_to_port_8080() {
        match parse(&["payoff", "serve"]).command {
            Command::Serve { port } => assert_eq!(port, 8080),
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn plan_requires_at_least_one_debt() {
        assert!(Cli::try_parse_from(["payoff", "plan"]).is_err());
        assert!(Cli::try_parse_from(["payoff", "plan", "--debt", "nope"]).is_err());
    }

    #[test]
    fn plan_output_compares_both_strategies_by_default() {
        let args = plan_args(parse(&[
            "payoff",
            "plan",
            "--debt",
            "Credit Card:5000:18.99:150",
            "--debt",
            "Personal Loan:3000:15.49:90",
            "--extra-payment",
            "200",
        ]));
        let json: Value =
            serde_json::from_str(&plan_output(&args).expect("valid plan")).expect("json");
        assert_eq!(json["recommended"], "avalanche");
        assert_eq!(json["avalanche"]["totalMonths"], 25);
        assert!(json["interestSaved"].as_f64().unwrap_or_default() > 0.0);
        assert_eq!(json["warnings"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn plan_output_single_strategy_warns_when_non_convergent() {
        let args = plan_args(parse(&[
            "payoff",
            "plan",
            "--debt",
            "Payday:1000:24:15",
            "--strategy",
            "snowball",
            "--pretty",
        ]));
        let json: Value =
            serde_json::from_str(&plan_output(&args).expect("valid plan")).expect("json");
        assert_eq!(json["result"]["strategy"], "snowball");
        assert_eq!(json["result"]["totalMonths"], 600);
        assert_eq!(json["result"]["converged"], false);
        assert_eq!(json["warning"], crate::api::NON_CONVERGENT_WARNING);
    }

    #[test]
    fn plan_output_reports_invalid_debt() {
        let args = plan_args(parse(&["payoff", "plan", "--debt", "Card:0:18.99:150"]));
        let err = plan_output(&args).expect_err("zero balance is invalid");
        assert!(err.contains("balance"));

        let args = plan_args(parse(&[
            "payoff",
            "plan",
            "--debt",
            "Card:100:5:10",
            "--extra-payment=-5",
        ]));
        assert!(plan_output(&args).is_err());
    }
}

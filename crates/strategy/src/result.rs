use std::collections::BTreeMap;

use common::{AnalysisResult, Config, Error, FeeBreakdown, Result, SignalKind};

/// Exchange fee schedule applied by the result builder.
///
/// All rates are percentages. The maker/taker base rate and the auxiliary
/// levy apply to the traded amount; the tax applies to the resulting fee.
/// Configured once — strategies never carry their own fee constants.
#[derive(Debug, Clone, Copy)]
pub struct FeeSchedule {
    pub maker_pct: f64,
    pub taker_pct: f64,
    pub levy_pct: f64,
    pub tax_pct: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            maker_pct: 0.10,
            taker_pct: 0.15,
            levy_pct: 0.05,
            tax_pct: 11.0,
        }
    }
}

impl FeeSchedule {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            maker_pct: cfg.fee_maker_pct,
            taker_pct: cfg.fee_taker_pct,
            levy_pct: cfg.fee_levy_pct,
            tax_pct: cfg.fee_tax_pct,
        }
    }

    /// Taker-side estimate for a market entry of `amount` quote units.
    pub fn estimate(&self, amount: f64) -> FeeBreakdown {
        let base = amount * self.taker_pct / 100.0;
        let levy = amount * self.levy_pct / 100.0;
        let tax = (base + levy) * self.tax_pct / 100.0;
        FeeBreakdown {
            base,
            levy,
            tax,
            total: base + levy + tax,
        }
    }
}

/// Sole constructor of [`AnalysisResult`].
///
/// Every strategy funnels its computed signal, confidence, and price levels
/// through here so the output record is structurally identical across
/// strategies. The builder derives the risk:reward ratio, the fee estimate,
/// and the profit/loss projections itself.
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    title: String,
    description: String,
    signal: SignalKind,
    confidence: f64,
    entry: f64,
    stop_loss: f64,
    take_profit: f64,
    amount: f64,
    fees: FeeSchedule,
    indicators: BTreeMap<String, serde_json::Value>,
    notes: Vec<String>,
}

impl ResultBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            signal: SignalKind::Neutral,
            confidence: 0.0,
            entry: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            amount: 0.0,
            fees: FeeSchedule::default(),
            indicators: BTreeMap::new(),
            notes: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn signal(mut self, signal: SignalKind) -> Self {
        self.signal = signal;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn levels(mut self, entry: f64, stop_loss: f64, take_profit: f64) -> Self {
        self.entry = entry;
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    pub fn fee_schedule(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn indicator(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.indicators.insert(name.into(), value.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn build(self) -> Result<AnalysisResult> {
        if !self.entry.is_finite() || self.entry <= 0.0 {
            return Err(Error::InvalidNumericInput(format!(
                "entry price must be positive, got {}",
                self.entry
            )));
        }
        if !self.stop_loss.is_finite() || !self.take_profit.is_finite() {
            return Err(Error::InvalidNumericInput(
                "non-finite stop/target level".into(),
            ));
        }

        let risk = (self.entry - self.stop_loss).abs();
        let reward = (self.take_profit - self.entry).abs();
        if risk <= self.entry * f64::EPSILON {
            return Err(Error::InvalidNumericInput(
                "degenerate risk: stop equals entry".into(),
            ));
        }

        let ratio = reward / risk;
        let fee = self.fees.estimate(self.amount);
        let units = self.amount / self.entry;

        Ok(AnalysisResult {
            title: self.title,
            description: self.description,
            signal: self.signal,
            confidence: self.confidence.clamp(0.0, 100.0),
            entry: self.entry,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            risk_reward: format!("1:{}", format_ratio(ratio)),
            fee,
            potential_profit: (reward * units - fee.total).max(0.0),
            potential_loss: (risk * units + fee.total).max(0.0),
            indicators: self.indicators,
            notes: self.notes,
        })
    }
}

/// Ratio rendered with at most two decimals, trailing zeros trimmed, so a
/// whole ratio reads "2" rather than "2.00".
fn format_ratio(ratio: f64) -> String {
    let rounded = (ratio * 100.0).round() / 100.0;
    let text = format!("{rounded:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

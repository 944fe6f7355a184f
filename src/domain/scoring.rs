//! Advisory scoring: fundamental and technical scores from ordered threshold
//! rules, blended into a BUY/HOLD/SELL recommendation.
//!
//! A [`RuleSet`] starts from a base score and walks its rules in order; every
//! rule whose predicate holds adds its delta and contributes a reason. The
//! result is clamped to 0..=100.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::StocksimError;
use crate::domain::indicator::{IndicatorSettings, IndicatorSnapshot, Trend};
use crate::domain::quote::Quote;

type Predicate<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;
type Reason<C> = Box<dyn Fn(&C) -> String + Send + Sync>;

pub const BASE_SCORE: f64 = 50.0;

pub struct ScoreRule<C> {
    predicate: Predicate<C>,
    delta: f64,
    reason: Reason<C>,
}

impl<C> ScoreRule<C> {
    pub fn new(
        predicate: impl Fn(&C) -> bool + Send + Sync + 'static,
        delta: f64,
        reason: impl Fn(&C) -> String + Send + Sync + 'static,
    ) -> Self {
        ScoreRule {
            predicate: Box::new(predicate),
            delta,
            reason: Box::new(reason),
        }
    }

    pub fn applies(&self, ctx: &C) -> bool {
        (self.predicate)(ctx)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub value: f64,
    pub reasons: Vec<String>,
}

pub struct RuleSet<C> {
    base: f64,
    rules: Vec<ScoreRule<C>>,
}

impl<C> RuleSet<C> {
    pub fn new(base: f64) -> Self {
        RuleSet {
            base,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: ScoreRule<C>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn push(&mut self, rule: ScoreRule<C>) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn evaluate(&self, ctx: &C) -> Score {
        let mut value = self.base;
        let mut reasons = Vec::new();
        for rule in self.rules.iter().filter(|r| r.applies(ctx)) {
            value += rule.delta;
            reasons.push((rule.reason)(ctx));
        }
        Score {
            value: value.clamp(0.0, 100.0),
            reasons,
        }
    }
}

/// Inputs for the technical axis: last price and the indicator snapshot at it.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalContext {
    pub price: f64,
    pub snapshot: IndicatorSnapshot,
}

pub fn fundamental_rules() -> RuleSet<Quote> {
    RuleSet::new(BASE_SCORE)
        .with_rule(ScoreRule::new(
            |q: &Quote| q.pe.is_some_and(|pe| pe > 0.0 && pe < 15.0),
            15.0,
            |q| format!("P/E of {:.1} is attractive", q.pe.unwrap_or_default()),
        ))
        .with_rule(ScoreRule::new(
            |q: &Quote| q.pe.is_some_and(|pe| pe > 30.0),
            -15.0,
            |q| format!("P/E of {:.1} is elevated", q.pe.unwrap_or_default()),
        ))
        .with_rule(ScoreRule::new(
            |q: &Quote| q.beta.is_some_and(|b| b < 1.0),
            5.0,
            |q| format!("Low volatility (beta {:.2})", q.beta.unwrap_or_default()),
        ))
        .with_rule(ScoreRule::new(
            |q: &Quote| q.beta.is_some_and(|b| b > 1.5),
            -10.0,
            |q| format!("High volatility (beta {:.2})", q.beta.unwrap_or_default()),
        ))
        .with_rule(ScoreRule::new(
            |q: &Quote| q.pct_above_52w_low().is_some_and(|d| d <= 10.0),
            10.0,
            |_| "Trading within 10% of 52-week low".to_string(),
        ))
        .with_rule(ScoreRule::new(
            |q: &Quote| q.pct_below_52w_high().is_some_and(|d| d <= 5.0),
            -5.0,
            |_| "Trading within 5% of 52-week high".to_string(),
        ))
        .with_rule(ScoreRule::new(
            |q: &Quote| q.market_cap.is_some_and(|m| m >= 10e9),
            10.0,
            |_| "Large-cap stability".to_string(),
        ))
        .with_rule(ScoreRule::new(
            |q: &Quote| q.change_percent < -5.0,
            -5.0,
            |q| format!("Down {:.1}% on the day", q.change_percent.abs()),
        ))
}

pub fn technical_rules() -> RuleSet<TechnicalContext> {
    RuleSet::new(BASE_SCORE)
        .with_rule(ScoreRule::new(
            |c: &TechnicalContext| c.snapshot.rsi.is_some_and(|r| r < 30.0),
            20.0,
            |c| format!("RSI {:.1} indicates oversold", c.snapshot.rsi_or_neutral()),
        ))
        .with_rule(ScoreRule::new(
            |c: &TechnicalContext| c.snapshot.rsi.is_some_and(|r| r > 70.0),
            -20.0,
            |c| format!("RSI {:.1} indicates overbought", c.snapshot.rsi_or_neutral()),
        ))
        .with_rule(ScoreRule::new(
            |c: &TechnicalContext| c.snapshot.trend == Trend::StrongUp,
            15.0,
            |_| "Strong uptrend".to_string(),
        ))
        .with_rule(ScoreRule::new(
            |c: &TechnicalContext| c.snapshot.trend == Trend::Up,
            10.0,
            |_| "Uptrend".to_string(),
        ))
        .with_rule(ScoreRule::new(
            |c: &TechnicalContext| c.snapshot.trend == Trend::Down,
            -10.0,
            |_| "Downtrend".to_string(),
        ))
        .with_rule(ScoreRule::new(
            |c: &TechnicalContext| c.snapshot.trend == Trend::StrongDown,
            -15.0,
            |_| "Strong downtrend".to_string(),
        ))
        .with_rule(ScoreRule::new(
            |c: &TechnicalContext| c.snapshot.sma_short.is_some_and(|s| c.price > s),
            5.0,
            |_| "Price above short-term average".to_string(),
        ))
        .with_rule(ScoreRule::new(
            |c: &TechnicalContext| match (c.snapshot.sma_short, c.snapshot.sma_long) {
                (Some(short), Some(long)) => short > long,
                _ => false,
            },
            10.0,
            |_| "Short-term average above long-term average".to_string(),
        ))
        .with_rule(ScoreRule::new(
            |c: &TechnicalContext| match (c.snapshot.sma_short, c.snapshot.sma_long) {
                (Some(short), Some(long)) => short < long,
                _ => false,
            },
            -10.0,
            |_| "Short-term average below long-term average".to_string(),
        ))
        .with_rule(ScoreRule::new(
            |c: &TechnicalContext| c.snapshot.volume_ratio > 1.5,
            5.0,
            |c| format!("Volume {:.1}x its recent average", c.snapshot.volume_ratio),
        ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Hold,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => f.pad("BUY"),
            Action::Hold => f.pad("HOLD"),
            Action::Sell => f.pad("SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorSettings {
    pub fundamental_weight: f64,
    pub technical_weight: f64,
    pub buy_at: f64,
    pub sell_at: f64,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        AdvisorSettings {
            fundamental_weight: 0.4,
            technical_weight: 0.6,
            buy_at: 65.0,
            sell_at: 35.0,
        }
    }
}

impl AdvisorSettings {
    pub fn validate(&self) -> Result<(), StocksimError> {
        if self.fundamental_weight < 0.0 || self.technical_weight < 0.0 {
            return Err(StocksimError::invalid(
                "fundamental_weight",
                "weights must be non-negative",
            ));
        }
        if self.fundamental_weight + self.technical_weight <= 0.0 {
            return Err(StocksimError::invalid(
                "technical_weight",
                "weights must not both be zero",
            ));
        }
        if !(0.0..=100.0).contains(&self.sell_at)
            || !(0.0..=100.0).contains(&self.buy_at)
            || self.sell_at >= self.buy_at
        {
            return Err(StocksimError::invalid(
                "buy_at",
                "cut-offs must satisfy 0 <= sell_at < buy_at <= 100",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub ticker: String,
    pub action: Action,
    pub confidence: f64,
    pub overall_score: f64,
    pub fundamental_score: f64,
    pub technical_score: f64,
    pub reasons: Vec<String>,
}

pub struct Advisor {
    settings: AdvisorSettings,
    indicators: IndicatorSettings,
    fundamental: RuleSet<Quote>,
    technical: RuleSet<TechnicalContext>,
}

impl Default for Advisor {
    fn default() -> Self {
        Self::new(AdvisorSettings::default())
    }
}

impl Advisor {
    pub fn new(settings: AdvisorSettings) -> Self {
        Self::with_rules(settings, fundamental_rules(), technical_rules())
    }

    pub fn with_rules(
        settings: AdvisorSettings,
        fundamental: RuleSet<Quote>,
        technical: RuleSet<TechnicalContext>,
    ) -> Self {
        Advisor {
            settings,
            indicators: IndicatorSettings::default(),
            fundamental,
            technical,
        }
    }

    /// Lookback windows for the technical snapshot this advisor scores.
    pub fn with_indicators(mut self, indicators: IndicatorSettings) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn settings(&self) -> &AdvisorSettings {
        &self.settings
    }

    pub fn indicators(&self) -> &IndicatorSettings {
        &self.indicators
    }

    pub fn recommend(&self, quote: &Quote, technical: &TechnicalContext) -> Recommendation {
        let fundamental = self.fundamental.evaluate(quote);
        let technical = self.technical.evaluate(technical);

        let fw = self.settings.fundamental_weight;
        let tw = self.settings.technical_weight;
        let overall = (fw * fundamental.value + tw * technical.value) / (fw + tw);

        let action = if overall >= self.settings.buy_at {
            Action::Buy
        } else if overall <= self.settings.sell_at {
            Action::Sell
        } else {
            Action::Hold
        };

        let mut reasons = fundamental.reasons;
        reasons.extend(technical.reasons);

        Recommendation {
            ticker: quote.ticker.clone(),
            action,
            confidence: 50.0 + (overall - 50.0).abs(),
            overall_score: overall,
            fundamental_score: fundamental.value,
            technical_score: technical.value,
            reasons,
        }
    }
}

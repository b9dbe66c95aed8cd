use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use super::fx_errors::FxError;
use super::fx_model::ExchangeRate;

/// Converts amounts between currencies from per-pair rate time series.
///
/// Rates are stored as independent `BTreeMap<Date, Rate>` series per pair,
/// with inverses derived on insert. Lookups use the nearest observation on
/// or before the requested date, falling forward to the first observation
/// only when no earlier one exists. When no direct series exists, a
/// breadth-first search over the pair graph finds a conversion path.
pub struct CurrencyConverter {
    adj: HashMap<String, HashSet<String>>,
    rates: HashMap<(String, String), BTreeMap<NaiveDate, Decimal>>,
}

impl CurrencyConverter {
    pub fn new(exchange_rates: Vec<ExchangeRate>) -> Self {
        let mut converter = CurrencyConverter {
            adj: HashMap::new(),
            rates: HashMap::new(),
        };
        converter.add_rates(exchange_rates);
        converter
    }

    /// Inserts rates, deriving the inverse series for each pair.
    pub fn add_rates(&mut self, rates: Vec<ExchangeRate>) {
        for rate in rates {
            if rate.from_currency == rate.to_currency || rate.rate.is_zero() {
                continue;
            }
            let forward = (rate.from_currency.clone(), rate.to_currency.clone());
            let inverse = (rate.to_currency.clone(), rate.from_currency.clone());

            self.rates
                .entry(forward)
                .or_default()
                .insert(rate.date, rate.rate);
            self.rates
                .entry(inverse)
                .or_default()
                .insert(rate.date, Decimal::ONE / rate.rate);

            self.adj
                .entry(rate.from_currency.clone())
                .or_default()
                .insert(rate.to_currency.clone());
            self.adj
                .entry(rate.to_currency)
                .or_default()
                .insert(rate.from_currency);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// On-or-before rate for a directly connected pair. Dates before the
    /// first observation fall forward to it.
    fn direct_rate(&self, from: &str, to: &str, date: NaiveDate) -> Option<Decimal> {
        let history = self.rates.get(&(from.to_string(), to.to_string()))?;
        history
            .range(..=date)
            .next_back()
            .or_else(|| history.range(date..).next())
            .map(|(_, r)| *r)
    }

    /// Rate for an arbitrary pair, routing through intermediate currencies
    /// when no direct series exists.
    pub fn rate(&self, from: &str, to: &str, date: NaiveDate) -> Result<Decimal, FxError> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        if let Some(rate) = self.direct_rate(from, to, date) {
            return Ok(rate);
        }

        // BFS over the pair graph, accumulating the rate along the path.
        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut queue: VecDeque<(&str, Decimal)> = VecDeque::from([(from, Decimal::ONE)]);
        while let Some((current, acc)) = queue.pop_front() {
            let neighbors = match self.adj.get(current) {
                Some(n) => n,
                None => continue,
            };
            for next in neighbors {
                if !visited.insert(next.as_str()) {
                    continue;
                }
                let hop = match self.direct_rate(current, next, date) {
                    Some(r) => r,
                    None => continue,
                };
                let combined = acc * hop;
                if next == to {
                    return Ok(combined);
                }
                queue.push_back((next.as_str(), combined));
            }
        }
        Err(FxError::RateNotFound(format!("{}/{} on {}", from, to, date)))
    }

    pub fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<Decimal, FxError> {
        Ok(amount * self.rate(from, to, date)?)
    }
}

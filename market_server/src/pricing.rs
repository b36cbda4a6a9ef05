//! Формула ценообразования.
//!
//! Единая точка пересчёта цены товара: и периодический пересчёт, и пересчёт
//! при покупке проходят через [`next_price`]. Отличие вариантов — только
//! явный режим [`Fluctuation`]: при покупке к формуле добавляется случайное
//! колебание, периодический пересчёт детерминирован.

use crate::config::PRICING;
use commons::models::{PricePoint, Product};
use commons::randomizer::random_unit;
use commons::utils::days_between;

/// Режим случайного колебания цены.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fluctuation {
    /// Без колебания — периодический пересчёт.
    Steady,
    /// Со случайным колебанием по чувствительности товара — пересчёт
    /// при покупке.
    Randomized,
}

/// Вычислить следующую цену товара.
///
/// ## Формула
///
/// - спад по времени: от 1.0 в день создания до 0.5 к концу окна продаж
/// - фактор дефицита: от 1.0 при полном складе до 2.0 при распродаже
/// - случайное колебание (только [`Fluctuation::Randomized`]):
///   `0.95 + U[0,1) * чувствительность * 0.1`
///
/// Результат ограничивается диапазоном `[cost_price, max_price]`.
///
/// ## Returns
///
/// `None`, если окно продаж истекло — цена заморожена и не меняется.
/// Деления формулы защищены валидацией при создании товара:
/// `duration_days >= 1` и `initial_supply >= 1`.
pub fn next_price(product: &Product, now: u64, fluctuation: Fluctuation) -> Option<f64> {
    let days_passed = days_between(product.created_at, now);
    if days_passed >= product.duration_days {
        return None;
    }

    let time_decay =
        1.0 - (days_passed as f64 / product.duration_days as f64) * PRICING.time_decay_limit;

    let sold = (product.initial_supply - product.current_supply) as f64;
    let supply_factor = 1.0 + sold / product.initial_supply as f64;

    let random_factor = match fluctuation {
        Fluctuation::Steady => 1.0,
        Fluctuation::Randomized => {
            PRICING.fluctuation_floor + random_unit() * product.sensitivity * PRICING.fluctuation_span
        }
    };

    let raw = product.latest_price() * time_decay * supply_factor * random_factor;

    Some(raw.clamp(product.cost_price, product.max_price))
}

/// Пересчитать цену товара и записать её в историю.
///
/// ## Returns
///
/// Новая цена, либо `None` для замороженного товара — запись в историю
/// в этом случае не добавляется.
pub fn reprice(product: &mut Product, now: u64, fluctuation: Fluctuation) -> Option<f64> {
    let price = next_price(product, now, fluctuation)?;
    product.price_history.push(PricePoint {
        timestamp: now,
        price,
    });
    Some(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use commons::models::ProductForm;
    use commons::utils::SECS_PER_DAY;

    const NOW: u64 = 1_700_000_000;

    /// Товар из контрольного примера: создан 10 дней назад, продана
    /// половина тиража, текущая цена 100.
    fn reference_product() -> Product {
        let form = ProductForm {
            name: "Collector Vinyl".to_string(),
            description: "Numbered pressing".to_string(),
            image: "https://example.com/vinyl.png".to_string(),
            initial_price: 100.0,
            cost_price: 50.0,
            max_price: 200.0,
            initial_supply: 100,
            duration_days: 100,
            sensitivity: 0.1,
        };

        let created_at = NOW - 10 * SECS_PER_DAY;
        let mut product = Product::from_form(form, "1".into(), created_at).unwrap();
        product.current_supply = 50;
        product
    }

    #[test]
    fn steady_price_matches_reference_value() {
        // timeDecay = 0.95, supplyFactor = 1.5: 100 * 0.95 * 1.5 = 142.5
        let product = reference_product();
        let price = next_price(&product, NOW, Fluctuation::Steady).unwrap();

        assert!((price - 142.5).abs() < 1e-9);
    }

    #[test]
    fn price_clamped_to_cost_floor() {
        let mut product = reference_product();
        product.cost_price = 60.0;
        product.price_history.last_mut().unwrap().price = 40.0;

        // 40 * 0.95 * 1.5 = 57.0 — ниже себестоимости, ровно 60.0
        let price = next_price(&product, NOW, Fluctuation::Steady).unwrap();
        assert_eq!(price, 60.0);
    }

    #[test]
    fn price_clamped_to_max_cap() {
        let mut product = reference_product();
        product.max_price = 120.0;

        let price = next_price(&product, NOW, Fluctuation::Steady).unwrap();
        assert_eq!(price, 120.0);
    }

    #[test]
    fn expired_window_freezes_price() {
        let mut product = reference_product();
        product.created_at = NOW - 100 * SECS_PER_DAY;

        assert!(next_price(&product, NOW, Fluctuation::Steady).is_none());
        assert!(next_price(&product, NOW, Fluctuation::Randomized).is_none());
    }

    #[test]
    fn reprice_appends_history_entry() {
        let mut product = reference_product();
        let history_len = product.price_history.len();

        let price = reprice(&mut product, NOW, Fluctuation::Steady).unwrap();

        assert_eq!(product.price_history.len(), history_len + 1);
        let last = product.price_history.last().unwrap();
        assert_eq!(last.price, price);
        assert_eq!(last.timestamp, NOW);
    }

    #[test]
    fn reprice_frozen_leaves_history_unchanged() {
        let mut product = reference_product();
        product.created_at = NOW - 365 * SECS_PER_DAY;
        let before = product.price_history.clone();

        assert!(reprice(&mut product, NOW, Fluctuation::Steady).is_none());
        assert_eq!(product.price_history, before);
    }

    #[test]
    fn randomized_factor_stays_in_sensitivity_bounds() {
        // Свежий товар с полным складом: спад и дефицит равны 1.0,
        // остаётся только случайное колебание.
        let form = ProductForm {
            name: "Fresh Drop".to_string(),
            description: String::new(),
            image: String::new(),
            initial_price: 100.0,
            cost_price: 1.0,
            max_price: 1_000.0,
            initial_supply: 10,
            duration_days: 30,
            sensitivity: 0.5,
        };
        let product = Product::from_form(form, "1".into(), NOW).unwrap();

        for _ in 0..200 {
            let price = next_price(&product, NOW, Fluctuation::Randomized).unwrap();
            assert!(price >= 100.0 * 0.95);
            assert!(price < 100.0 * (0.95 + 0.5 * 0.1));
        }
    }

    #[test]
    fn all_history_prices_within_bounds_after_repricing() {
        let mut product = reference_product();

        for day in 11..40 {
            let now = product.created_at + day * SECS_PER_DAY;
            reprice(&mut product, now, Fluctuation::Steady);
        }

        assert!(product
            .price_history
            .iter()
            .all(|p| p.price >= product.cost_price && p.price <= product.max_price));
    }
}

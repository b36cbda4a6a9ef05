//! Модели данных для приложений.

use crate::errors::MarketError;
use macros::{MarketDisplay, MarketEnumDisplay};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Диапазон допустимых значений коэффициента чувствительности товара.
pub const SENSITIVITY_RANGE: RangeInclusive<f64> = 0.01..=1.0;

/// Точка истории цены: когда и по какой цене.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Временная метка изменения (секунды UNIX).
    pub timestamp: u64,
    /// Цена на момент изменения.
    pub price: f64,
}

/// Товар лимитированной серии.
///
/// Сериализуется в camelCase — формат хранения каталога целиком, одним
/// JSON-массивом.
///
/// ## Инварианты
///
/// - `price_history` никогда не пуста: при создании заполняется начальной
///   ценой
/// - каждая цена истории лежит в пределах `[cost_price, max_price]`
/// - `current_supply` только уменьшается и не превышает `initial_supply`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Уникальный идентификатор (производная от времени создания).
    pub id: String,
    /// Название товара.
    pub name: String,
    /// Описание товара.
    pub description: String,
    /// Ссылка на изображение.
    pub image: String,
    /// Начальная цена.
    pub initial_price: f64,
    /// Себестоимость — нижняя граница цены.
    pub cost_price: f64,
    /// Максимальная цена — верхняя граница.
    pub max_price: f64,
    /// Первоначальный тираж.
    pub initial_supply: u32,
    /// Остаток на складе.
    pub current_supply: u32,
    /// Длительность продаж в днях (окно временного спада цены).
    pub duration_days: u64,
    /// Коэффициент чувствительности случайного колебания цены.
    pub sensitivity: f64,
    /// Временная метка создания (секунды UNIX).
    pub created_at: u64,
    /// История изменения цены, в хронологическом порядке.
    pub price_history: Vec<PricePoint>,
}

impl Product {
    /// Создать товар из формы с проверкой значений.
    ///
    /// Все деления формулы ценообразования защищаются здесь, на этапе
    /// создания: нулевая длительность или нулевой тираж отклоняются.
    ///
    /// ## Ошибки
    ///
    /// [`MarketError::ValueError`] при некорректных полях формы.
    pub fn from_form(form: ProductForm, id: String, now: u64) -> Result<Self, MarketError> {
        form.validate()?;

        let history = vec![PricePoint {
            timestamp: now,
            price: form.initial_price,
        }];

        Ok(Self {
            id,
            name: form.name,
            description: form.description,
            image: form.image,
            initial_price: form.initial_price,
            cost_price: form.cost_price,
            max_price: form.max_price,
            initial_supply: form.initial_supply,
            current_supply: form.initial_supply,
            duration_days: form.duration_days,
            sensitivity: form.sensitivity,
            created_at: now,
            price_history: history,
        })
    }

    /// Актуальная цена товара — последняя запись истории.
    ///
    /// Если история повреждена и пуста, возвращается начальная цена.
    pub fn latest_price(&self) -> f64 {
        self.price_history
            .last()
            .map(|p| p.price)
            .unwrap_or(self.initial_price)
    }

    /// Товар распродан?
    pub fn is_sold_out(&self) -> bool {
        self.current_supply == 0
    }
}

/// Форма создания товара.
///
/// Содержит все поля [`Product`], задаваемые продавцом. Идентификатор,
/// остаток и история формируются при создании.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    /// Название товара.
    pub name: String,
    /// Описание товара.
    pub description: String,
    /// Ссылка на изображение.
    pub image: String,
    /// Начальная цена.
    pub initial_price: f64,
    /// Себестоимость (нижняя граница цены).
    pub cost_price: f64,
    /// Максимальная цена (верхняя граница).
    pub max_price: f64,
    /// Первоначальный тираж.
    pub initial_supply: u32,
    /// Длительность продаж в днях.
    pub duration_days: u64,
    /// Коэффициент чувствительности, от 0.01 до 1.0.
    pub sensitivity: f64,
}

impl ProductForm {
    /// Проверить значения формы.
    ///
    /// ## Ошибки
    ///
    /// [`MarketError::ValueError`] с указанием первого некорректного поля.
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.name.trim().is_empty() {
            return Err(MarketError::value_err("название товара не заполнено"));
        }
        if self.duration_days == 0 {
            return Err(MarketError::value_err(
                "длительность продаж должна быть не менее 1 дня",
            ));
        }
        if self.initial_supply == 0 {
            return Err(MarketError::value_err(
                "тираж должен быть не менее 1 единицы",
            ));
        }
        if self.initial_price <= 0.0 || self.cost_price <= 0.0 {
            return Err(MarketError::value_err("цены должны быть положительными"));
        }
        if self.cost_price > self.initial_price || self.initial_price > self.max_price {
            return Err(MarketError::value_err(
                "требуется: себестоимость <= начальная цена <= максимальная цена",
            ));
        }
        if !SENSITIVITY_RANGE.contains(&self.sensitivity) {
            return Err(MarketError::value_err(format!(
                "чувствительность {} вне диапазона {} — {}",
                self.sensitivity,
                SENSITIVITY_RANGE.start(),
                SENSITIVITY_RANGE.end()
            )));
        }
        Ok(())
    }
}

/// Обновление цены товара, транслируемое подписчикам по UDP.
///
/// Строковый формат: `id|цена|метка` (см. [`macros::MarketDisplay`]).
#[derive(Debug, Clone, PartialEq, MarketDisplay, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    /// Идентификатор товара.
    pub product_id: String,
    /// Новая цена.
    pub price: f64,
    /// Временная метка пересчёта.
    pub timestamp: u64,
}

/// Вид транзакции аккаунта.
#[derive(Debug, Clone, MarketEnumDisplay, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    /// Покупка.
    #[str("purchase")]
    Purchase,
    /// Продажа.
    #[str("sale")]
    Sale,
}

/// Статус транзакции аккаунта.
#[derive(Debug, Clone, MarketEnumDisplay, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Завершена.
    #[str("completed")]
    Completed,
    /// В обработке.
    #[str("pending")]
    Pending,
    /// Не удалась.
    #[str("failed")]
    Failed,
}

/// Запись истории транзакций аккаунта.
///
/// Используется только для отображения и не сверяется с состоянием
/// каталога товаров.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Идентификатор записи.
    pub id: String,
    /// Вид транзакции.
    pub kind: TxKind,
    /// Название товара.
    pub product_name: String,
    /// Количество единиц.
    pub amount: u32,
    /// Цена за единицу на момент сделки.
    pub price: f64,
    /// Временная метка сделки.
    pub timestamp: u64,
    /// Статус сделки.
    pub status: TxStatus,
}

/// Профиль пользователя.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Отображаемое имя.
    pub username: String,
    /// Дата регистрации (секунды UNIX).
    pub join_date: u64,
    /// Количество покупок.
    pub purchase_count: u32,
    /// Количество продаж.
    pub sale_count: u32,
    /// Избранные товары.
    pub favorite_products: Vec<String>,
}

impl UserProfile {
    /// Профиль по умолчанию — создаётся при первом обращении к аккаунту.
    pub fn with_defaults(now: u64) -> Self {
        Self {
            username: "Market User".to_string(),
            join_date: now,
            purchase_count: 0,
            sale_count: 0,
            favorite_products: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> ProductForm {
        ProductForm {
            name: "Limited Edition Sneakers".to_string(),
            description: "Exclusive drop".to_string(),
            image: "https://example.com/sneakers.png".to_string(),
            initial_price: 1000.0,
            cost_price: 500.0,
            max_price: 10000.0,
            initial_supply: 100,
            duration_days: 100,
            sensitivity: 0.1,
        }
    }

    #[test]
    fn product_created_with_seeded_history() {
        let product = Product::from_form(sample_form(), "1".into(), 1_000).unwrap();

        assert_eq!(product.price_history.len(), 1);
        assert_eq!(product.latest_price(), 1000.0);
        assert_eq!(product.current_supply, product.initial_supply);
        assert_eq!(product.created_at, 1_000);
    }

    #[test]
    fn form_rejects_zero_duration() {
        let mut form = sample_form();
        form.duration_days = 0;
        assert!(form.validate().is_err());
    }

    #[test]
    fn form_rejects_zero_supply() {
        let mut form = sample_form();
        form.initial_supply = 0;
        assert!(form.validate().is_err());
    }

    #[test]
    fn form_rejects_sensitivity_out_of_range() {
        let mut form = sample_form();
        form.sensitivity = 1.5;
        assert!(form.validate().is_err());

        form.sensitivity = 0.001;
        assert!(form.validate().is_err());
    }

    #[test]
    fn form_rejects_inverted_price_bounds() {
        let mut form = sample_form();
        form.cost_price = 2000.0;
        assert!(form.validate().is_err());
    }

    #[test]
    fn latest_price_falls_back_to_initial() {
        let mut product = Product::from_form(sample_form(), "1".into(), 1_000).unwrap();
        product.price_history.clear();

        assert_eq!(product.latest_price(), 1000.0);
    }

    #[test]
    fn price_update_roundtrip() {
        let update = PriceUpdate {
            product_id: "1700000000001".to_string(),
            price: 142.5,
            timestamp: 1_700_000_100,
        };

        let line = update.to_string();
        assert_eq!(line, "1700000000001|142.5|1700000100");

        let parsed: PriceUpdate = line.parse().unwrap();
        assert_eq!(parsed, update);
    }

    #[test]
    fn tx_kind_display_and_parse() {
        assert_eq!(TxKind::Purchase.to_string(), "purchase");
        assert!(matches!("sale".parse::<TxKind>(), Ok(TxKind::Sale)));
        assert!("swap".parse::<TxKind>().is_err());
    }
}

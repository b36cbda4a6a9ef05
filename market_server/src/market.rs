//! Операции маркетплейса.
//!
//! Все операции читают коллекцию из хранилища целиком, меняют её в памяти
//! и записывают обратно целиком — другой согласованности контракт
//! хранилища не даёт.

use crate::pricing::{reprice, Fluctuation};
use crate::store::MarketStore;
use crate::wallet::WalletBridge;
use commons::errors::MarketError;
use commons::models::{
    PriceUpdate, Product, ProductForm, TransactionRecord, TxKind, TxStatus, UserProfile,
};
use commons::utils::SECS_PER_DAY;
use log::info;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Счётчик для уникализации идентификаторов, созданных в одну секунду.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Сформировать идентификатор, производный от времени создания.
fn gen_id(now: u64) -> String {
    let seq = ID_COUNTER.fetch_add(1, Ordering::SeqCst) % 1000;
    format!("{}{:03}", now, seq)
}

/// Квитанция о покупке.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// Идентификатор товара.
    pub product_id: String,
    /// Название товара.
    pub product_name: String,
    /// Сколько единиц куплено (после ограничения остатком).
    pub quantity: u32,
    /// Цена за единицу на момент покупки.
    pub unit_price: f64,
    /// Сумма перевода.
    pub total: f64,
    /// Подпись подтверждённой транзакции.
    pub signature: String,
    /// Новая цена после покупки, если окно продаж ещё открыто.
    pub new_price: Option<f64>,
}

/// Представление аккаунта: профиль и история транзакций.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    /// Профиль пользователя.
    pub profile: UserProfile,
    /// История транзакций, только для отображения.
    pub transactions: Vec<TransactionRecord>,
}

/// Маркетплейс лимитированных товаров.
///
/// Владеет хранилищем; вся бизнес-логика — здесь, хранилище подменяемо
/// (файловое в приложении, в памяти — в тестах).
pub struct Marketplace<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> Marketplace<S> {
    /// Создать маркетплейс поверх хранилища.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Весь каталог товаров.
    pub fn products(&self) -> Result<Vec<Product>, MarketError> {
        self.store.list_products()
    }

    /// Карточка товара по идентификатору.
    pub fn product(&self, id: &str) -> Result<Product, MarketError> {
        self.store
            .list_products()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| MarketError::product_err(format!("товар {} не найден", id)))
    }

    /// Добавить товар в каталог.
    ///
    /// Форма валидируется, история цены заполняется начальной ценой,
    /// каталог перезаписывается целиком.
    pub fn add_product(&self, form: ProductForm, now: u64) -> Result<Product, MarketError> {
        let product = Product::from_form(form, gen_id(now), now)?;

        let mut products = self.store.list_products()?;
        products.push(product.clone());
        self.store.save_products(&products)?;

        info!("Товар {} добавлен в каталог: {}", product.id, product.name);
        Ok(product)
    }

    /// Купить товар.
    ///
    /// Запрошенное количество ограничивается диапазоном
    /// `[1, current_supply]`. Сначала перевод через кошелёк, затем
    /// списание остатка, ровно один пересчёт цены со случайным колебанием
    /// и одна запись каталога. Перевод и локальный учёт не атомарны.
    ///
    /// ## Ошибки
    ///
    /// - [`MarketError::ProductError`] — товар не найден или распродан
    /// - ошибки кошелька — см. [`WalletBridge::transfer`]
    pub fn purchase(
        &self,
        id: &str,
        quantity: u32,
        now: u64,
        wallet: &mut dyn WalletBridge,
    ) -> Result<PurchaseReceipt, MarketError> {
        let mut products = self.store.list_products()?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| MarketError::product_err(format!("товар {} не найден", id)))?;

        if product.is_sold_out() {
            return Err(MarketError::product_err(format!(
                "товар {} распродан",
                product.name
            )));
        }

        let quantity = quantity.clamp(1, product.current_supply);
        let unit_price = product.latest_price();
        let total = unit_price * quantity as f64;

        let signature = wallet.transfer(total)?;

        product.current_supply -= quantity;
        let new_price = reprice(product, now, Fluctuation::Randomized);

        let receipt = PurchaseReceipt {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price,
            total,
            signature,
            new_price,
        };

        self.store.save_products(&products)?;
        self.record_purchase(&receipt, now)?;

        info!(
            "Покупка: {} x{} на сумму {:.2}",
            receipt.product_name, receipt.quantity, receipt.total
        );
        Ok(receipt)
    }

    /// Записать покупку в историю транзакций и профиль.
    fn record_purchase(&self, receipt: &PurchaseReceipt, now: u64) -> Result<(), MarketError> {
        let mut transactions = self.store.list_transactions()?;
        transactions.push(TransactionRecord {
            id: gen_id(now),
            kind: TxKind::Purchase,
            product_name: receipt.product_name.clone(),
            amount: receipt.quantity,
            price: receipt.unit_price,
            timestamp: now,
            status: TxStatus::Completed,
        });
        self.store.save_transactions(&transactions)?;

        let mut profile = self
            .store
            .load_profile()?
            .unwrap_or_else(|| UserProfile::with_defaults(now));
        profile.purchase_count += 1;
        self.store.save_profile(&profile)
    }

    /// Периодический пересчёт цен всего каталога.
    ///
    /// Детерминированный вариант формулы, без случайного колебания.
    /// Замороженные товары (окно продаж истекло) пропускаются без записи
    /// в историю. Каталог перезаписывается целиком при каждом проходе.
    ///
    /// ## Returns
    ///
    /// Применённые обновления цен — для трансляции подписчикам.
    pub fn reprice_all(&self, now: u64) -> Result<Vec<PriceUpdate>, MarketError> {
        let mut products = self.store.list_products()?;

        let mut updates = Vec::new();
        for product in products.iter_mut() {
            if let Some(price) = reprice(product, now, Fluctuation::Steady) {
                updates.push(PriceUpdate {
                    product_id: product.id.clone(),
                    price,
                    timestamp: now,
                });
            }
        }

        self.store.save_products(&products)?;
        Ok(updates)
    }

    /// Аккаунт: профиль и история транзакций.
    ///
    /// При первом обращении создаётся профиль по умолчанию и пара
    /// демонстрационных записей истории.
    pub fn account(&self, now: u64) -> Result<AccountView, MarketError> {
        let profile = match self.store.load_profile()? {
            Some(profile) => profile,
            None => {
                let profile = UserProfile::with_defaults(now);
                self.store.save_profile(&profile)?;
                profile
            }
        };

        let mut transactions = self.store.list_transactions()?;
        if transactions.is_empty() {
            transactions = demo_transactions(now);
            self.store.save_transactions(&transactions)?;
        }

        Ok(AccountView {
            profile,
            transactions,
        })
    }
}

/// Демонстрационная история транзакций для пустого аккаунта.
fn demo_transactions(now: u64) -> Vec<TransactionRecord> {
    vec![
        TransactionRecord {
            id: gen_id(now),
            kind: TxKind::Purchase,
            product_name: "Limited Edition Sneakers".to_string(),
            amount: 1,
            price: 2.5,
            timestamp: now - 2 * SECS_PER_DAY,
            status: TxStatus::Completed,
        },
        TransactionRecord {
            id: gen_id(now),
            kind: TxKind::Purchase,
            product_name: "Digital Artwork".to_string(),
            amount: 1,
            price: 1.8,
            timestamp: now - 5 * SECS_PER_DAY,
            status: TxStatus::Completed,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::wallet::SimulatedWallet;

    const NOW: u64 = 1_700_000_000;

    fn sample_form(name: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            description: "Exclusive drop".to_string(),
            image: "https://example.com/item.png".to_string(),
            initial_price: 100.0,
            cost_price: 50.0,
            max_price: 200.0,
            initial_supply: 10,
            duration_days: 100,
            sensitivity: 0.1,
        }
    }

    fn market_with_product() -> (Marketplace<MemoryStore>, String) {
        let market = Marketplace::new(MemoryStore::new());
        let product = market.add_product(sample_form("Collector Vinyl"), NOW).unwrap();
        (market, product.id)
    }

    fn connected_wallet() -> SimulatedWallet {
        let mut wallet = SimulatedWallet::with_balance(1_000_000.0);
        wallet.connect().unwrap();
        wallet
    }

    #[test]
    fn add_product_persists_catalog() {
        let (market, id) = market_with_product();

        let products = market.products().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, id);
        assert_eq!(products[0].price_history.len(), 1);
    }

    #[test]
    fn add_product_rejects_invalid_form() {
        let market = Marketplace::new(MemoryStore::new());
        let mut form = sample_form("Broken");
        form.duration_days = 0;

        assert!(market.add_product(form, NOW).is_err());
        assert!(market.products().unwrap().is_empty());
    }

    #[test]
    fn unknown_product_is_an_error() {
        let (market, _) = market_with_product();
        assert!(market.product("missing").is_err());
    }

    #[test]
    fn purchase_decrements_supply_and_appends_history() {
        let (market, id) = market_with_product();
        let mut wallet = connected_wallet();

        let receipt = market.purchase(&id, 3, NOW, &mut wallet).unwrap();

        assert_eq!(receipt.quantity, 3);
        assert_eq!(receipt.unit_price, 100.0);
        assert!(receipt.new_price.is_some());

        let product = market.product(&id).unwrap();
        assert_eq!(product.current_supply, 7);
        assert_eq!(product.price_history.len(), 2);
    }

    #[test]
    fn purchase_clamps_quantity_to_supply() {
        let (market, id) = market_with_product();
        let mut wallet = connected_wallet();

        let receipt = market.purchase(&id, 500, NOW, &mut wallet).unwrap();

        assert_eq!(receipt.quantity, 10);
        assert_eq!(market.product(&id).unwrap().current_supply, 0);
    }

    #[test]
    fn purchase_sold_out_is_an_error() {
        let (market, id) = market_with_product();
        let mut wallet = connected_wallet();

        market.purchase(&id, 10, NOW, &mut wallet).unwrap();
        let result = market.purchase(&id, 1, NOW, &mut wallet);

        assert!(matches!(result, Err(MarketError::ProductError(_))));
        assert_eq!(market.product(&id).unwrap().current_supply, 0);
    }

    #[test]
    fn failed_transfer_leaves_catalog_untouched() {
        let (market, id) = market_with_product();
        let mut wallet = SimulatedWallet::with_balance(1.0);
        wallet.connect().unwrap();

        let result = market.purchase(&id, 2, NOW, &mut wallet);
        assert!(matches!(result, Err(MarketError::InsufficientFunds)));

        let product = market.product(&id).unwrap();
        assert_eq!(product.current_supply, 10);
        assert_eq!(product.price_history.len(), 1);
        assert!(market.account(NOW).is_ok());
    }

    #[test]
    fn purchase_records_transaction_and_profile() {
        let (market, id) = market_with_product();
        let mut wallet = connected_wallet();

        market.purchase(&id, 1, NOW, &mut wallet).unwrap();

        let transactions = market.store.list_transactions().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, 1);
        assert!(matches!(transactions[0].kind, TxKind::Purchase));

        let profile = market.store.load_profile().unwrap().unwrap();
        assert_eq!(profile.purchase_count, 1);
    }

    #[test]
    fn supply_never_increases_over_lifetime() {
        let (market, id) = market_with_product();
        let mut wallet = connected_wallet();

        let mut last_supply = market.product(&id).unwrap().current_supply;
        for _ in 0..4 {
            market.purchase(&id, 2, NOW, &mut wallet).unwrap();
            let supply = market.product(&id).unwrap().current_supply;
            assert!(supply <= last_supply);
            last_supply = supply;
        }
    }

    #[test]
    fn reprice_all_matches_reference_value() {
        // Контрольный пример: 10 из 100 дней, продана половина тиража,
        // цена 100 — ожидается 142.5.
        let market = Marketplace::new(MemoryStore::new());
        let mut form = sample_form("Reference");
        form.initial_supply = 100;
        let product = market
            .add_product(form, NOW - 10 * SECS_PER_DAY)
            .unwrap();

        let mut products = market.products().unwrap();
        products[0].current_supply = 50;
        market.store.save_products(&products).unwrap();

        let updates = market.reprice_all(NOW).unwrap();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].product_id, product.id);
        assert!((updates[0].price - 142.5).abs() < 1e-9);

        let stored = market.product(&product.id).unwrap();
        assert_eq!(stored.price_history.len(), 2);
        assert!((stored.latest_price() - 142.5).abs() < 1e-9);
    }

    #[test]
    fn reprice_all_skips_frozen_products() {
        let market = Marketplace::new(MemoryStore::new());
        let mut form = sample_form("Expired");
        form.duration_days = 5;
        let product = market
            .add_product(form, NOW - 6 * SECS_PER_DAY)
            .unwrap();

        let updates = market.reprice_all(NOW).unwrap();

        assert!(updates.is_empty());
        let stored = market.product(&product.id).unwrap();
        assert_eq!(stored.price_history.len(), 1);
        assert_eq!(stored.latest_price(), 100.0);
    }

    #[test]
    fn history_timestamps_are_non_decreasing() {
        let (market, id) = market_with_product();
        let mut wallet = connected_wallet();

        market.reprice_all(NOW + 10).unwrap();
        market.purchase(&id, 1, NOW + 20, &mut wallet).unwrap();
        market.reprice_all(NOW + 30).unwrap();

        let product = market.product(&id).unwrap();
        assert!(product
            .price_history
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(!product.price_history.is_empty());
    }

    #[test]
    fn account_seeds_profile_and_demo_history() {
        let market = Marketplace::new(MemoryStore::new());

        let view = market.account(NOW).unwrap();

        assert_eq!(view.profile.username, "Market User");
        assert_eq!(view.transactions.len(), 2);

        // Повторное обращение не создаёт дубликатов.
        let again = market.account(NOW + 100).unwrap();
        assert_eq!(again.transactions.len(), 2);
        assert_eq!(again.profile.join_date, NOW);
    }
}

//! Мост к кошельку.
//!
//! Подпись и отправка перевода — забота внешнего кошелька; здесь только
//! тонкий контракт и его симуляция. Перевод всегда уходит на фиксированный
//! адрес площадки [`RECIPIENT_ADDRESS`] и подтверждается синхронно.

use crate::config::{
    BASE58_ALPHABET, GAS_FEE, RECIPIENT_ADDRESS, SIM_WALLET_BALANCE, TX_SIGNATURE_LEN,
    WALLET_ADDRESS_LEN,
};
use commons::errors::MarketError;
use commons::randomizer::{random_by_tuple, random_string};
use log::info;

/// Контракт кошелька для покупки товаров.
///
/// Перевод и локальный учёт покупки не атомарны: подтверждённый перевод
/// при последующей ошибке записи каталога остаётся без локального следа.
pub trait WalletBridge {
    /// Подключить кошелёк. Возвращает публичный адрес.
    fn connect(&mut self) -> Result<String, MarketError>;
    /// Отключить кошелёк.
    fn disconnect(&mut self);
    /// Кошелёк подключён?
    fn is_connected(&self) -> bool;
    /// Публичный адрес подключённого кошелька.
    fn address(&self) -> Option<String>;
    /// Текущий баланс.
    fn balance(&self) -> Result<f64, MarketError>;
    /// Перевести `amount` на адрес площадки и дождаться подтверждения.
    ///
    /// ## Returns
    ///
    /// Подпись подтверждённой транзакции.
    fn transfer(&mut self, amount: f64) -> Result<String, MarketError>;
}

/// Симулируемый кошелёк.
///
/// Случайный адрес и стартовый баланс, фиксированная комиссия за перевод.
/// Флаг `auto_approve` позволяет детерминированно проверить отказ
/// пользователя, `expire_next_reference` — истечение платёжной ссылки.
#[derive(Debug)]
pub struct SimulatedWallet {
    connected: bool,
    auto_approve: bool,
    expire_next_reference: bool,
    address: String,
    balance: f64,
}

impl SimulatedWallet {
    /// Создать кошелёк со случайным адресом и балансом.
    pub fn new() -> Self {
        Self {
            connected: false,
            auto_approve: true,
            expire_next_reference: false,
            address: random_string(BASE58_ALPHABET, WALLET_ADDRESS_LEN),
            balance: random_by_tuple(SIM_WALLET_BALANCE),
        }
    }

    /// Кошелёк с заданным балансом.
    pub fn with_balance(balance: f64) -> Self {
        Self {
            balance,
            ..Self::new()
        }
    }

    /// Отклонять следующие операции, как это сделал бы пользователь
    /// в окне подтверждения.
    pub fn set_auto_approve(&mut self, approve: bool) {
        self.auto_approve = approve;
    }

    /// Обесценить платёжную ссылку следующего перевода.
    pub fn expire_next_reference(&mut self) {
        self.expire_next_reference = true;
    }
}

impl Default for SimulatedWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletBridge for SimulatedWallet {
    fn connect(&mut self) -> Result<String, MarketError> {
        self.connected = true;
        info!("Кошелёк подключён: {}", self.address);
        Ok(self.address.clone())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        info!("Кошелёк отключён");
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn address(&self) -> Option<String> {
        self.connected.then(|| self.address.clone())
    }

    fn balance(&self) -> Result<f64, MarketError> {
        if !self.connected {
            return Err(MarketError::wallet_err("кошелёк не подключён"));
        }
        Ok(self.balance)
    }

    fn transfer(&mut self, amount: f64) -> Result<String, MarketError> {
        if !self.connected {
            return Err(MarketError::wallet_err("кошелёк не подключён"));
        }
        if !self.auto_approve {
            return Err(MarketError::WalletRejected);
        }
        if self.expire_next_reference {
            self.expire_next_reference = false;
            return Err(MarketError::ExpiredReference);
        }
        if amount <= 0.0 {
            return Err(MarketError::wallet_err(format!(
                "некорректная сумма перевода: {}",
                amount
            )));
        }

        let total = amount + GAS_FEE;
        if total > self.balance {
            return Err(MarketError::InsufficientFunds);
        }

        self.balance -= total;
        let signature = random_string(BASE58_ALPHABET, TX_SIGNATURE_LEN);
        info!(
            "Перевод {} на {} подтверждён, подпись {}",
            amount, RECIPIENT_ADDRESS, signature
        );

        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_requires_connection() {
        let mut wallet = SimulatedWallet::with_balance(100.0);
        assert!(wallet.transfer(1.0).is_err());
    }

    #[test]
    fn transfer_decrements_balance_and_signs() {
        let mut wallet = SimulatedWallet::with_balance(100.0);
        wallet.connect().unwrap();

        let signature = wallet.transfer(40.0).unwrap();

        assert_eq!(signature.len(), TX_SIGNATURE_LEN);
        let balance = wallet.balance().unwrap();
        assert!((balance - (60.0 - GAS_FEE)).abs() < 1e-9);
    }

    #[test]
    fn transfer_insufficient_funds() {
        let mut wallet = SimulatedWallet::with_balance(10.0);
        wallet.connect().unwrap();

        let result = wallet.transfer(50.0);
        assert!(matches!(result, Err(MarketError::InsufficientFunds)));
        assert_eq!(wallet.balance().unwrap(), 10.0);
    }

    #[test]
    fn transfer_rejected_by_user() {
        let mut wallet = SimulatedWallet::with_balance(100.0);
        wallet.connect().unwrap();
        wallet.set_auto_approve(false);

        let result = wallet.transfer(1.0);
        assert!(matches!(result, Err(MarketError::WalletRejected)));
    }

    #[test]
    fn transfer_expired_reference_once() {
        let mut wallet = SimulatedWallet::with_balance(100.0);
        wallet.connect().unwrap();
        wallet.expire_next_reference();

        assert!(matches!(
            wallet.transfer(1.0),
            Err(MarketError::ExpiredReference)
        ));
        // Следующий перевод проходит.
        assert!(wallet.transfer(1.0).is_ok());
    }

    #[test]
    fn address_hidden_when_disconnected() {
        let mut wallet = SimulatedWallet::new();
        assert!(wallet.address().is_none());

        let addr = wallet.connect().unwrap();
        assert_eq!(wallet.address().unwrap(), addr);

        wallet.disconnect();
        assert!(wallet.address().is_none());
        assert!(wallet.balance().is_err());
    }
}

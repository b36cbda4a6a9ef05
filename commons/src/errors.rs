//! Собственные типы ошибок приложения.
//!
//! Для поддержки функциональности применяется крейт `thiserror`.

use std::sync::PoisonError;
use thiserror::Error;

/// Дерево ошибок приложений Market.
#[derive(Error, Debug)]
pub enum MarketError {
    /// Некорректное значение.
    ///
    /// Например, если ожидается число в диапазоне от 0.01 до 1.0,
    /// а передано 5.0.
    #[error("неверное значение: {0}")]
    ValueError(String),

    /// Ошибка каталога товаров: товар не найден, распродан и т.п.
    #[error("ошибка товара: {0}")]
    ProductError(String),

    /// Некорректная команда клиента.
    #[error("ошибка команды: {0}")]
    CommandError(String),

    /// Ошибка чтения или записи хранилища.
    #[error("ошибка хранилища: {0}")]
    StorageError(String),

    /// Ошибка блокировки mutex.
    #[error("ошибка блокировки: {0}")]
    LockError(String),

    /// Пользователь отклонил операцию в кошельке.
    #[error("транзакция отклонена пользователем")]
    WalletRejected,

    /// Недостаточно средств для перевода.
    #[error("недостаточно средств на балансе кошелька")]
    InsufficientFunds,

    /// Срок действия платёжной ссылки истёк.
    #[error("срок действия платёжной ссылки истёк")]
    ExpiredReference,

    /// Прочие ошибки кошелька.
    #[error("ошибка кошелька: {0}")]
    WalletFailure(String),
}

impl<T> From<PoisonError<T>> for MarketError {
    fn from(err: PoisonError<T>) -> Self {
        MarketError::LockError(err.to_string())
    }
}

impl MarketError {
    /// Конструктор для ошибки [`MarketError::ValueError`].
    pub fn value_err(message: impl Into<String>) -> MarketError {
        Self::ValueError(message.into())
    }

    /// Конструктор для ошибки [`MarketError::ProductError`].
    pub fn product_err(message: impl Into<String>) -> MarketError {
        Self::ProductError(message.into())
    }

    /// Конструктор для ошибки [`MarketError::CommandError`].
    pub fn command_err(message: impl Into<String>) -> MarketError {
        Self::CommandError(message.into())
    }

    /// Конструктор для ошибки [`MarketError::StorageError`].
    pub fn storage_err(message: impl Into<String>) -> MarketError {
        Self::StorageError(message.into())
    }

    /// Конструктор для ошибки [`MarketError::WalletFailure`].
    pub fn wallet_err(message: impl Into<String>) -> MarketError {
        Self::WalletFailure(message.into())
    }
}

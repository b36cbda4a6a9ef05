//! Хранилище состояния маркетплейса.
//!
//! Всё состояние — три JSON-файла в каталоге данных: каталог товаров,
//! история транзакций и профиль пользователя. Каждая запись перезаписывает
//! файл целиком: побеждает последняя запись, частичных обновлений нет.
//! Такой контракт не даёт транзакционных гарантий — два одновременных
//! писателя молча затирают друг друга.

use crate::config::{PRODUCTS_FILENAME, PROFILE_FILENAME, TRANSACTIONS_FILENAME};
use commons::errors::MarketError;
use commons::models::{Product, TransactionRecord, UserProfile};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Контракт хранилища маркетплейса.
///
/// `list_*` возвращает коллекцию целиком, `save_*` её целиком
/// перезаписывает. Отсутствующие или повреждённые данные читаются как
/// пустая коллекция, не как ошибка.
pub trait MarketStore {
    /// Считать каталог товаров.
    fn list_products(&self) -> Result<Vec<Product>, MarketError>;
    /// Сохранить каталог товаров целиком.
    fn save_products(&self, products: &[Product]) -> Result<(), MarketError>;
    /// Считать историю транзакций.
    fn list_transactions(&self) -> Result<Vec<TransactionRecord>, MarketError>;
    /// Сохранить историю транзакций целиком.
    fn save_transactions(&self, transactions: &[TransactionRecord]) -> Result<(), MarketError>;
    /// Считать профиль пользователя, если он создан.
    fn load_profile(&self) -> Result<Option<UserProfile>, MarketError>;
    /// Сохранить профиль пользователя.
    fn save_profile(&self, profile: &UserProfile) -> Result<(), MarketError>;
}

/// Файловое хранилище.
#[derive(Debug)]
pub struct FileStore {
    /// Каталог данных.
    dir: PathBuf,
}

impl FileStore {
    /// Создать хранилище в указанном каталоге.
    ///
    /// Каталог создаётся при первой записи, чтение из несуществующего
    /// каталога даёт пустые коллекции.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Считать JSON-значение из файла.
    ///
    /// Отсутствующий файл и повреждённое содержимое равнозначны пустому
    /// значению: фиксируются предупреждением в лог и не прерывают работу.
    fn read_json<T: DeserializeOwned + Default>(&self, filename: &str) -> T {
        let path = self.dir.join(filename);
        if !path.exists() {
            return T::default();
        }

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Не удалось прочитать {}: {}", path.display(), err);
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!("Повреждённые данные в {}: {}", path.display(), err);
                T::default()
            }
        }
    }

    /// Записать JSON-значение в файл, перезаписав прежнее содержимое.
    fn write_json<T: Serialize>(&self, filename: &str, value: &T) -> Result<(), MarketError> {
        fs::create_dir_all(&self.dir).map_err(|err| {
            MarketError::storage_err(format!(
                "не удалось создать каталог {}: {}",
                self.dir.display(),
                err
            ))
        })?;

        let path = self.dir.join(filename);
        let raw = serde_json::to_string_pretty(value)
            .map_err(|err| MarketError::storage_err(format!("ошибка сериализации: {}", err)))?;

        fs::write(&path, raw).map_err(|err| {
            MarketError::storage_err(format!("не удалось записать {}: {}", path.display(), err))
        })
    }
}

impl MarketStore for FileStore {
    fn list_products(&self) -> Result<Vec<Product>, MarketError> {
        Ok(self.read_json(PRODUCTS_FILENAME))
    }

    fn save_products(&self, products: &[Product]) -> Result<(), MarketError> {
        self.write_json(PRODUCTS_FILENAME, &products)
    }

    fn list_transactions(&self) -> Result<Vec<TransactionRecord>, MarketError> {
        Ok(self.read_json(TRANSACTIONS_FILENAME))
    }

    fn save_transactions(&self, transactions: &[TransactionRecord]) -> Result<(), MarketError> {
        self.write_json(TRANSACTIONS_FILENAME, &transactions)
    }

    fn load_profile(&self) -> Result<Option<UserProfile>, MarketError> {
        Ok(self.read_json(PROFILE_FILENAME))
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<(), MarketError> {
        self.write_json(PROFILE_FILENAME, profile)
    }
}

/// Хранилище в памяти — подменная реализация для тестов.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: Mutex<Vec<Product>>,
    transactions: Mutex<Vec<TransactionRecord>>,
    profile: Mutex<Option<UserProfile>>,
}

impl MemoryStore {
    /// Создать пустое хранилище.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarketStore for MemoryStore {
    fn list_products(&self) -> Result<Vec<Product>, MarketError> {
        Ok(self.products.lock()?.clone())
    }

    fn save_products(&self, products: &[Product]) -> Result<(), MarketError> {
        *self.products.lock()? = products.to_vec();
        Ok(())
    }

    fn list_transactions(&self) -> Result<Vec<TransactionRecord>, MarketError> {
        Ok(self.transactions.lock()?.clone())
    }

    fn save_transactions(&self, transactions: &[TransactionRecord]) -> Result<(), MarketError> {
        *self.transactions.lock()? = transactions.to_vec();
        Ok(())
    }

    fn load_profile(&self) -> Result<Option<UserProfile>, MarketError> {
        Ok(self.profile.lock()?.clone())
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<(), MarketError> {
        *self.profile.lock()? = Some(profile.clone());
        Ok(())
    }
}

//! Модели данных для приложения.

use commons::errors::MarketError;
use crossbeam_channel::{Receiver, Sender};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{atomic::AtomicBool, Arc};
use url::Url;

/// Подписчик на обновления цен.
#[derive(Debug, Clone)]
pub(crate) struct ClientSubscription {
    /// Уникальный ID сессии.
    pub unique_id: usize,
    /// TCP-адрес клиента.
    pub tcp_addr: SocketAddr,
    /// UDP-адрес для стрима.
    pub udp_url: Url,
    /// Идентификаторы товаров подписки. Пустой набор — весь каталог.
    pub product_ids: HashSet<String>,
    /// Персональный отправитель обновлений.
    pub sender: Sender<String>,
    /// Получатель обновлений.
    pub recv: Receiver<String>,
    /// Флаг остановки.
    pub stop_flag: Arc<AtomicBool>,
}

impl ClientSubscription {
    /// Создать нового клиента с указанными параметрами.
    ///
    /// - `unique_id` — уникальный идентификатор клиента в сессии
    /// - `tcp_addr` — TCP адрес клиента
    /// - `udp_url` — UDP-ссылка клиента
    /// - `product_ids` — набор товаров для подписки на обновления цен
    /// - `sender` — канал для отправки сообщений клиенту
    /// - `recv` — канал для получения сообщений от клиента
    pub fn new(
        unique_id: usize,
        tcp_addr: SocketAddr,
        udp_url: Url,
        product_ids: HashSet<String>,
        sender: Sender<String>,
        recv: Receiver<String>,
    ) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        Self {
            unique_id,
            tcp_addr,
            udp_url,
            product_ids,
            sender,
            recv,
            stop_flag,
        }
    }

    /// Подписан ли клиент на обновления указанного товара.
    pub fn wants(&self, product_id: &str) -> bool {
        self.product_ids.is_empty() || self.product_ids.contains(product_id)
    }
}

/// Менеджер клиентов.
#[derive(Debug, Default)]
pub struct ClientManager {
    /// `HashMap` активных клиентов, где ключ — уникальный id сессии.
    pub clients: HashMap<usize, ClientSubscription>,
}

impl ClientManager {
    /// Создать менеджера.
    pub(crate) fn new() -> Self {
        Self {
            ..Default::default()
        }
    }

    /// Проверить, существует ли клиент с предоставленным id.
    pub fn id_exists(&self, unique_id: usize) -> bool {
        self.clients.contains_key(&unique_id)
    }

    /// Добавить нового клиента.
    pub fn add_client(&mut self, client: ClientSubscription) -> Result<(), MarketError> {
        if self.id_exists(client.unique_id) {
            return Err(MarketError::value_err("Клиент уже существует"));
        }
        self.clients.insert(client.unique_id, client);
        Ok(())
    }

    /// Удалить клиента.
    pub fn remove_client(&mut self, unique_id: usize) -> Result<ClientSubscription, MarketError> {
        self.clients
            .remove(&unique_id)
            .ok_or_else(|| MarketError::command_err("подписка не найдена"))
    }
}

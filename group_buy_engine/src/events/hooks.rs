use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{DividendPaidEvent, EventHandler, EventProducer, GroupSettledEvent, Handler};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub group_settled_producer: Vec<EventProducer<GroupSettledEvent>>,
    pub dividend_paid_producer: Vec<EventProducer<DividendPaidEvent>>,
}

pub struct EventHandlers {
    pub on_group_settled: Option<EventHandler<GroupSettledEvent>>,
    pub on_dividend_paid: Option<EventHandler<DividendPaidEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_group_settled = hooks.on_group_settled.map(|f| EventHandler::new(buffer_size, f));
        let on_dividend_paid = hooks.on_dividend_paid.map(|f| EventHandler::new(buffer_size, f));
        Self { on_group_settled, on_dividend_paid }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_group_settled {
            result.group_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_dividend_paid {
            result.dividend_paid_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_group_settled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_dividend_paid {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_group_settled: Option<Handler<GroupSettledEvent>>,
    pub on_dividend_paid: Option<Handler<DividendPaidEvent>>,
}

impl EventHooks {
    pub fn on_group_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(GroupSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_group_settled = Some(Arc::new(f));
        self
    }

    pub fn on_dividend_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DividendPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_dividend_paid = Some(Arc::new(f));
        self
    }
}

//! Construction tests for KeyedWorkItem.

#[cfg(test)]
mod tests {
    use crate::core::{KeyedWorkItem, TimeDomain, TimerFiring, TimerTimestamp, WorkPayload};
    use crate::errors::WorkItemViolation;
    use crate::model::{BoundedWindow, EventTime, Key, WindowedValue};

    fn elements(values: &[i64]) -> Vec<WindowedValue> {
        values
            .iter()
            .map(|v| WindowedValue::in_global_window(serde_json::json!(v)))
            .collect()
    }

    fn expiry(key: &str) -> TimerFiring {
        TimerFiring::new(
            Key::from(key),
            BoundedWindow::interval(EventTime::from_millis(0), EventTime::from_millis(60_000)),
            "expiry",
            TimeDomain::EventTime,
            TimerTimestamp::Event(EventTime::from_millis(59_999)),
        )
        .unwrap()
    }

    #[test]
    fn test_elements_item() {
        let item = KeyedWorkItem::new(Key::from("k1"), None, elements(&[1, 2, 3])).unwrap();

        assert_eq!(item.key(), &Key::from("k1"));
        assert!(item.timer_firing().is_none());
        assert!(!item.is_timer());
        let values: Vec<_> = item.elements().iter().map(|e| e.value.clone()).collect();
        assert_eq!(values, vec![serde_json::json!(1), serde_json::json!(2), serde_json::json!(3)]);
    }

    #[test]
    fn test_timer_item() {
        let item = KeyedWorkItem::new(Key::from("k1"), Some(expiry("k1")), Vec::new()).unwrap();

        assert!(item.is_timer());
        assert!(item.elements().is_empty());
        let firing = item.timer_firing().unwrap();
        assert_eq!(firing.name(), "expiry");
        assert_eq!(firing.time_domain(), TimeDomain::EventTime);
    }

    #[test]
    fn test_empty_payload_rejected() {
        let err = KeyedWorkItem::new(Key::from("k1"), None, Vec::new()).unwrap_err();
        assert_eq!(err.violation, WorkItemViolation::EmptyPayload);
        assert_eq!(err.key, Key::from("k1"));
    }

    #[test]
    fn test_timer_with_elements_rejected() {
        let err = KeyedWorkItem::new(Key::from("k1"), Some(expiry("k1")), elements(&[1])).unwrap_err();
        assert_eq!(err.violation, WorkItemViolation::AmbiguousPayload);
    }

    #[test]
    fn test_for_elements_rejects_empty() {
        let err = KeyedWorkItem::for_elements(Key::from("k1"), Vec::new()).unwrap_err();
        assert_eq!(err.violation, WorkItemViolation::EmptyPayload);
    }

    #[test]
    fn test_for_timer_rejects_foreign_key() {
        let err = KeyedWorkItem::for_timer(Key::from("k1"), expiry("k2")).unwrap_err();
        assert_eq!(err.violation, WorkItemViolation::KeyMismatch);
    }

    #[test]
    fn test_from_firing_takes_key_from_timer() {
        let item = KeyedWorkItem::from_firing(expiry("k7"));
        assert_eq!(item.key(), &Key::from("k7"));
    }

    #[test]
    fn test_into_parts_branches_on_payload() {
        let items = vec![
            KeyedWorkItem::for_elements(Key::from("k1"), elements(&[4])).unwrap(),
            KeyedWorkItem::from_firing(expiry("k1")),
        ];

        let mut timers = 0;
        let mut element_count = 0;
        for item in items {
            match item.into_parts().1 {
                WorkPayload::Timer(_) => timers += 1,
                WorkPayload::Elements(values) => element_count += values.len(),
            }
        }
        assert_eq!(timers, 1);
        assert_eq!(element_count, 1);
    }

    #[test]
    fn test_work_item_serializes_tagged_payload() {
        let item = KeyedWorkItem::for_elements(Key::from("k1"), elements(&[1])).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["key"], "k1");
        assert_eq!(json["payload"]["kind"], "elements");
    }
}

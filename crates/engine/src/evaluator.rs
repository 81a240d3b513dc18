//! One-shot alert evaluation.

use pricewatch_core::{AlertDirection, AlertFired, ChatConfig, ChatId, Price};

/// Decide which armed thresholds `price` crosses.
///
/// Both sides are checked independently, so a misconfigured chat with
/// `alert_below > alert_above` can fire both on the same tick.
pub fn evaluate(chat_id: ChatId, price: Price, config: &ChatConfig) -> Vec<AlertFired> {
    [AlertDirection::Above, AlertDirection::Below]
        .into_iter()
        .filter_map(|direction| {
            let threshold = config.alert(direction)?;
            direction.is_crossed(price, threshold).then_some(AlertFired {
                chat_id,
                direction,
                threshold,
                price,
            })
        })
        .collect()
}

/// Disarm every threshold that fired.
pub fn clear_fired(config: &mut ChatConfig, fired: &[AlertFired]) {
    for alert in fired {
        config.clear_alert(alert.direction);
    }
}

/// Evaluate and disarm in one step. Callers hold the chat's lock so the
/// next tick observes the cleared thresholds.
pub fn evaluate_and_clear(chat_id: ChatId, price: Price, config: &mut ChatConfig) -> Vec<AlertFired> {
    let fired = evaluate(chat_id, price, config);
    clear_fired(config, &fired);
    fired
}

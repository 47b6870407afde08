use super::*;
use crate::config::RemoteEndpointConfig;
use crate::test_utils::OrderProjection;
use uuid::Uuid;

#[test]
fn test_remote_rejects_empty_endpoint() {
    let result = EventRequester::<OrderProjection>::remote("");
    assert!(matches!(result, Err(HydrationError::Configuration(_))));

    let result = EventRequester::<OrderProjection>::remote("   ");
    assert!(matches!(result, Err(HydrationError::Configuration(_))));
}

#[test]
fn test_remote_keeps_endpoint() {
    let requester =
        EventRequester::<OrderProjection>::remote("http://inventory:8080/events").unwrap();
    assert_eq!(
        requester.target(),
        &Target::Remote("http://inventory:8080/events".to_string())
    );
    assert!(requester.is_empty());
}

#[test]
fn test_construction_styles_normalize() {
    let requester = EventRequester::<OrderProjection>::local()
        .single(|o| o.warehouse_id)
        .required_single(|o| o.customer_id)
        .list(|o| o.line_item_ids.clone().unwrap_or_default())
        .required_list(|o| o.carrier_ids.clone());

    assert_eq!(requester.single_selectors().len(), 2);
    assert_eq!(requester.list_selectors().len(), 2);
}

#[test]
fn test_absent_selector_groups_are_empty() {
    let requester = EventRequester::<OrderProjection>::local().with_selectors(None, None);
    assert!(requester.is_empty());

    let requester = EventRequester::<OrderProjection>::local().with_selectors(
        Some(vec![ForeignIdSelector::required(|o: &OrderProjection| o.customer_id)]),
        None,
    );
    assert_eq!(requester.single_selectors().len(), 1);
    assert!(requester.list_selectors().is_empty());
}

#[test]
fn test_with_selectors_routes_by_arity() {
    let items = [Uuid::new_v4(), Uuid::new_v4()];
    let order = OrderProjection::new(Uuid::new_v4())
        .with_line_items(items.iter().copied().map(Some).collect());

    let requester = EventRequester::<OrderProjection>::local().with_selectors(
        Some(vec![ForeignIdSelector::list(|o: &OrderProjection| {
            o.line_item_ids.clone().unwrap_or_default()
        })]),
        Some(vec![ForeignIdSelector::required(|o: &OrderProjection| o.customer_id)]),
    );

    assert_eq!(requester.single_selectors().len(), 1);
    assert_eq!(requester.list_selectors().len(), 1);

    let batch = vec![order.clone()];
    let ids = crate::fetch::collect_ids(&batch, &requester.all_selectors(&batch));
    assert_eq!(ids.len(), 3);
    assert!(items.iter().all(|id| ids.contains(id)));
    assert!(ids.contains(&order.customer_id));
}

#[test]
fn test_all_selectors_orders_single_before_list() {
    let customer = Uuid::new_v4();
    let item = Uuid::new_v4();
    let order = OrderProjection::new(customer).with_line_items(vec![Some(item)]);

    let requester = EventRequester::<OrderProjection>::local()
        .list(|o| o.line_item_ids.clone().unwrap_or_default())
        .required_single(|o| o.customer_id);

    let selectors = requester.all_selectors(std::slice::from_ref(&order));

    assert_eq!(selectors.len(), 2);
    assert!(matches!(selectors[0], ResolvedSelector::Shared(_)));
    assert_eq!(selectors[0].select(&order), Some(customer));
    assert!(matches!(
        selectors[1],
        ResolvedSelector::Attributed { owner, id } if owner == order.id && id == item
    ));
}

#[test]
fn test_remote_named_resolves_from_config() {
    let config = HydrationConfig {
        remotes: vec![RemoteEndpointConfig {
            name: "inventory".to_string(),
            url: "http://inventory:8080/events".to_string(),
        }],
        ..Default::default()
    };

    let requester = EventRequester::<OrderProjection>::remote_named(&config, "inventory").unwrap();
    assert_eq!(
        requester.target(),
        &Target::Remote("http://inventory:8080/events".to_string())
    );

    let missing = EventRequester::<OrderProjection>::remote_named(&config, "billing");
    assert!(matches!(missing, Err(HydrationError::Configuration(_))));
}

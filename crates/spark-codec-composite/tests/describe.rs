//! 结构化诊断输出：嵌套复合解码器的成员比外层多缩进一级。

use std::sync::Arc;

use spark_codec_composite::{
    CompositeDecoder, InMemoryCodecRegistry, MemberDescriptor, StructuralDescribe, ValueCodec,
};

#[derive(Debug, Default, PartialEq)]
struct Customer {
    name: String,
    email: String,
}

#[derive(Debug, Default, PartialEq)]
struct Order {
    id: u64,
    customer: Customer,
    tags: Vec<String>,
}

fn registry_with_customer() -> InMemoryCodecRegistry {
    let registry = InMemoryCodecRegistry::with_primitives();
    registry.register_list::<String>().expect("string list");
    let customer = CompositeDecoder::<Customer>::builder()
        .field(MemberDescriptor::new("name"), |c| &c.name, |c| &mut c.name)
        .field(MemberDescriptor::new("email"), |c| &c.email, |c| &mut c.email)
        .default_constructor()
        .build(&registry)
        .expect("customer decoder");
    registry.register(customer).expect("customer registered");
    registry
}

fn order_decoder(registry: &InMemoryCodecRegistry) -> CompositeDecoder<Order> {
    CompositeDecoder::<Order>::builder()
        .field(MemberDescriptor::new("id"), |o| &o.id, |o| &mut o.id)
        .field(
            MemberDescriptor::new("customer"),
            |o| &o.customer,
            |o| &mut o.customer,
        )
        .field(
            MemberDescriptor::new("tags").collection(),
            |o| &o.tags,
            |o| &mut o.tags,
        )
        .default_constructor()
        .build(registry)
        .expect("order decoder")
}

#[test]
fn nested_members_are_indented_one_level_deeper() {
    let registry = registry_with_customer();
    let order = order_decoder(&registry);

    let rendered = order.to_string();
    assert_eq!(
        rendered,
        "Order\n  id: u64\n  customer: Customer\n    name: String\n    email: String\n  tags: List<String>\n"
    );
}

#[test]
fn describe_depth_shifts_every_member_line() {
    let registry = registry_with_customer();
    let order = order_decoder(&registry);

    let mut out = String::new();
    order.describe(&mut out, 1).expect("string sink");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Order");
    assert_eq!(lines[1], "    id: u64");
    assert_eq!(lines[3], "      name: String");
}

#[test]
fn composite_codecs_advertise_structural_capability() {
    let registry = registry_with_customer();
    let order: Arc<dyn ValueCodec> = Arc::new(order_decoder(&registry));
    assert!(order.as_structural().is_some());
    assert_eq!(order.label(), "Order");

    let customer = order_decoder(&registry)
        .member_codec("customer")
        .cloned()
        .expect("customer member");
    assert!(customer.as_structural().is_some());

    let id = order_decoder(&registry)
        .member_codec("id")
        .cloned()
        .expect("id member");
    assert!(id.as_structural().is_none());
}

#[test]
fn type_name_override_is_rendered() {
    let registry = InMemoryCodecRegistry::with_primitives();
    let decoder = CompositeDecoder::<Customer>::builder()
        .type_name("crm.Customer")
        .field(MemberDescriptor::new("name"), |c| &c.name, |c| &mut c.name)
        .default_constructor()
        .build(&registry)
        .expect("customer decoder");
    assert_eq!(decoder.to_string(), "crm.Customer\n  name: String\n");
}

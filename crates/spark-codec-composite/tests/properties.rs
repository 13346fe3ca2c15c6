//! 解码器性质验证（proptest）。
//!
//! 目标类型 `Row` 以自定义 [`MemberAccess`] 把第 `i` 个成员映射到 `cells[i]`，从而在同一个类型上
//! 覆盖任意成员数 `N`。未被声明的槽位与 `untouched` 字段用于断言解码不会触碰无关成员。

use std::any::Any;
use std::sync::Arc;

use proptest::prelude::*;
use spark_codec_composite::{
    AbsentValuePolicy, AccessError, CompositeDecoder, DecodeError, DynValue,
    InMemoryCodecRegistry, MemberAccess, MemberDescriptor, Token, TokenCursor, ValueType,
};

const MAX_MEMBERS: usize = 8;
const SENTINEL: i64 = i64::MIN;

#[derive(Debug, PartialEq)]
struct Row {
    cells: Vec<Option<i64>>,
    untouched: u32,
}

fn fresh() -> Row {
    Row {
        cells: vec![Some(SENTINEL); MAX_MEMBERS],
        untouched: 7,
    }
}

/// 把成员映射到 `cells` 中固定下标的访问器。
struct Slot(usize);

impl MemberAccess<Row> for Slot {
    fn value_type(&self) -> ValueType {
        ValueType::of::<i64>()
    }

    fn is_nullable(&self) -> bool {
        true
    }

    fn read<'a>(&self, target: &'a Row) -> Option<&'a (dyn Any + Send + Sync)> {
        target.cells[self.0]
            .as_ref()
            .map(|value| value as &(dyn Any + Send + Sync))
    }

    fn write(&self, target: &mut Row, value: DynValue) -> Result<(), AccessError> {
        let value = value
            .downcast::<i64>()
            .map_err(|_| AccessError::TypeMismatch { expected: "i64" })?;
        target.cells[self.0] = Some(*value);
        Ok(())
    }

    fn clear(&self, target: &mut Row) -> Result<(), AccessError> {
        target.cells[self.0] = None;
        Ok(())
    }
}

fn name(index: usize) -> String {
    format!("m{index}")
}

fn row_decoder(policies: &[AbsentValuePolicy]) -> CompositeDecoder<Row> {
    let builder = policies
        .iter()
        .enumerate()
        .fold(CompositeDecoder::<Row>::builder(), |builder, (index, policy)| {
            builder.member(
                MemberDescriptor::new(name(index)).with_policy(*policy),
                Arc::new(Slot(index)),
            )
        });
    builder
        .constructor(fresh)
        .build(&InMemoryCodecRegistry::with_primitives())
        .expect("valid configuration")
}

fn policy() -> impl Strategy<Value = AbsentValuePolicy> {
    prop_oneof![
        Just(AbsentValuePolicy::SetToNull),
        Just(AbsentValuePolicy::KeepDefault),
        Just(AbsentValuePolicy::Prohibit),
    ]
}

/// 成员数 `N ∈ [0, 8)`，每个成员一个策略与一个非空值。
fn members() -> impl Strategy<Value = Vec<(AbsentValuePolicy, i64)>> {
    prop::collection::vec((policy(), any::<i64>()), 0..MAX_MEMBERS)
}

fn expected_row(values: impl IntoIterator<Item = (usize, Option<i64>)>) -> Row {
    let mut row = fresh();
    for (index, value) in values {
        row.cells[index] = value;
    }
    row
}

proptest! {
    #[test]
    fn positional_values_land_in_declared_slots(members in members()) {
        let policies: Vec<_> = members.iter().map(|(policy, _)| *policy).collect();
        let decoder = row_decoder(&policies);

        let mut tokens = vec![Token::Seq(Some(members.len()))];
        tokens.extend(members.iter().map(|(_, value)| Token::Int(*value)));
        let row = decoder
            .decode(&mut TokenCursor::new(tokens))
            .expect("exact item count");

        let expected = expected_row(
            members.iter().enumerate().map(|(index, (_, value))| (index, Some(*value))),
        );
        prop_assert_eq!(row, expected);
    }

    #[test]
    fn wrong_item_count_is_rejected(members in members(), delta in 1usize..4) {
        let policies: Vec<_> = members.iter().map(|(policy, _)| *policy).collect();
        let decoder = row_decoder(&policies);

        let actual = members.len() + delta;
        let mut tokens = vec![Token::Seq(Some(actual))];
        tokens.extend((0..actual).map(|_| Token::Int(0)));
        let err = decoder
            .decode(&mut TokenCursor::new(tokens))
            .expect_err("count differs");
        prop_assert_eq!(
            err,
            DecodeError::ItemCountMismatch {
                expected: members.len(),
                actual,
            }
        );
    }

    #[test]
    fn absent_value_follows_member_policy(
        members in prop::collection::vec((policy(), any::<i64>()), 1..MAX_MEMBERS),
        pick in any::<prop::sample::Index>(),
    ) {
        let absent = pick.index(members.len());
        let policies: Vec<_> = members.iter().map(|(policy, _)| *policy).collect();
        let decoder = row_decoder(&policies);

        let mut tokens = vec![Token::Seq(Some(members.len()))];
        tokens.extend(members.iter().enumerate().map(|(index, (_, value))| {
            if index == absent { Token::Nil } else { Token::Int(*value) }
        }));
        let outcome = decoder.decode(&mut TokenCursor::new(tokens));

        match policies[absent] {
            AbsentValuePolicy::Prohibit => {
                prop_assert_eq!(
                    outcome,
                    Err(DecodeError::NullNotPermitted { member: name(absent) })
                );
            }
            AbsentValuePolicy::SetToNull => {
                let row = outcome.expect("null written");
                prop_assert_eq!(row.cells[absent], None);
            }
            AbsentValuePolicy::KeepDefault => {
                let row = outcome.expect("default kept");
                prop_assert_eq!(row.cells[absent], Some(SENTINEL));
            }
        }
    }

    #[test]
    fn keyed_order_does_not_matter(
        (members, order) in members().prop_flat_map(|members| {
            let order: Vec<usize> = (0..members.len()).collect();
            (Just(members), Just(order).prop_shuffle())
        }),
        keep in prop::collection::vec(any::<bool>(), MAX_MEMBERS),
    ) {
        let policies: Vec<_> = members.iter().map(|(policy, _)| *policy).collect();
        let decoder = row_decoder(&policies);

        let present: Vec<usize> = order.into_iter().filter(|index| keep[*index]).collect();
        let mut tokens = vec![Token::Map(Some(present.len() + 1))];
        for &index in &present {
            tokens.push(Token::str(name(index)));
            tokens.push(Token::Int(members[index].1));
        }
        tokens.push(Token::str("not_a_member"));
        tokens.push(Token::Bool(true));

        let row = decoder
            .decode(&mut TokenCursor::new(tokens))
            .expect("unknown key skipped");
        let expected = expected_row(present.iter().map(|&index| (index, Some(members[index].1))));
        prop_assert_eq!(row, expected);
    }
}

// (c) Copyright 2025 Helsing GmbH. All rights reserved.
/// Convenience macro for creating a host [`Object`](crate::host::Object).
///
/// Values may be nested objects (note the '{' and '}'), lists (note the '[' and ']'), or any
/// expression convertible into a [`Value`](crate::host::Value).
///
/// ```rust
/// # use buffered_proxy::{object, host::Value};
/// let user = object! {
///     "name" => "Ada",
///     "age" => 36,
///     "retired" => Value::Null,
///     "address" => {
///         "city" => "London"
///     },
///     "tags" => ["math", { "label" => "engines" }]
/// };
/// assert_eq!(user.get("age"), Value::from(36));
/// ```
#[macro_export]
macro_rules! object {
    (@entries $object:ident; ) => {};

    (@entries $object:ident; $k:literal => {$($inner:tt)*} $(, $($rest:tt)*)?) => {
        $object.insert($k, $crate::host::Value::from($crate::object!{ $($inner)* }));
        $crate::object!(@entries $object; $($($rest)*)?);
    };

    (@entries $object:ident; $k:literal => [$($inner:tt)*] $(, $($rest:tt)*)?) => {
        $object.insert($k, $crate::host_value!([ $($inner)* ]));
        $crate::object!(@entries $object; $($($rest)*)?);
    };

    (@entries $object:ident; $k:literal => $v:expr $(, $($rest:tt)*)?) => {
        $object.insert($k, $crate::host::Value::from($v));
        $crate::object!(@entries $object; $($($rest)*)?);
    };

    ($($body:tt)*) => {
        {
            let object = $crate::host::Object::new();
            $crate::object!(@entries object; $($body)*);
            object
        }
    };
}

/// Convenience macro for creating a host [`Value`](crate::host::Value).
///
/// Object literal (note the '{' and '}'):
/// ```rust
/// # use buffered_proxy::host_value;
/// let value = host_value!({ "greeting" => "Hello" });
/// assert!(value.as_object().is_some());
/// ```
///
/// List literal (note the '[' and ']'):
/// ```rust
/// # use buffered_proxy::host_value;
/// let value = host_value!(["Banana", 42, ["nested"]]);
/// assert_eq!(value.as_list().unwrap().len(), 3);
/// ```
///
/// Anything else is converted with `Value::from`.
#[macro_export]
macro_rules! host_value {
    (@items $list:ident; ) => {};

    (@items $list:ident; {$($inner:tt)*} $(, $($rest:tt)*)?) => {
        $list.push($crate::object!{ $($inner)* });
        $crate::host_value!(@items $list; $($($rest)*)?);
    };

    (@items $list:ident; [$($inner:tt)*] $(, $($rest:tt)*)?) => {
        $list.push($crate::host_value!([ $($inner)* ]));
        $crate::host_value!(@items $list; $($($rest)*)?);
    };

    (@items $list:ident; $v:expr $(, $($rest:tt)*)?) => {
        $list.push($crate::host::Value::from($v));
        $crate::host_value!(@items $list; $($($rest)*)?);
    };

    ({$($inner:tt)*}) => {
        $crate::host::Value::from($crate::object!{ $($inner)* })
    };

    ([$($inner:tt)*]) => {
        {
            let list = $crate::host::List::new();
            $crate::host_value!(@items list; $($inner)*);
            $crate::host::Value::from(list)
        }
    };

    ($v:expr) => {
        $crate::host::Value::from($v)
    };
}

#[cfg(test)]
mod tests {
    use crate::host::{ObjectKind, Value};

    #[test]
    fn object_macro() {
        let object = object! {
            "name" => "Alice",
            "age" => 30,
            "nothing" => Value::Null,
            "address" => { "city" => "X", },
        };
        assert_eq!(object.kind(), ObjectKind::Plain);
        assert_eq!(object.keys(), ["address", "age", "name", "nothing"]);
        assert_eq!(object.get("age"), Value::from(30));
        assert_eq!(object.get("nothing"), Value::Null);
        let address = object.get("address");
        assert_eq!(address.as_object().unwrap().get("city"), Value::from("X"));
    }

    #[test]
    fn empty_literals() {
        assert!(object! {}.keys().is_empty());
        assert!(host_value!([]).as_list().unwrap().is_empty());
        assert!(host_value!({}).as_object().unwrap().keys().is_empty());
    }

    #[test]
    fn list_literals() {
        let value = host_value!([1, -2, "three", [4.0], { "five" => 5 }]);
        let list = value.as_list().unwrap();
        assert_eq!(list.len(), 5);
        assert_eq!(list.get(1), Some(Value::from(-2)));
        assert_eq!(list.get(3).unwrap().as_list().unwrap().len(), 1);
        assert_eq!(
            list.get(4).unwrap().as_object().unwrap().get("five"),
            Value::from(5)
        );
    }

    #[test]
    fn expressions_are_converted() {
        let name = String::from("Ada");
        assert_eq!(host_value!(name.as_str()), Value::from("Ada"));
        assert_eq!(host_value!(true), Value::from(true));
    }
}

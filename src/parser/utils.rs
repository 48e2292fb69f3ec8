use serde_json::Value;

// 第三方接口返回的 JSON 字段都视为可选，空字符串等同于不存在

pub fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn first_item<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).and_then(Value::as_array).and_then(|items| items.first())
}

/// 按顺序尝试顶层字段，最后尝试 `list_key` 数组第一个元素里的 `nested_key`
pub fn probe_string(value: &Value, keys: &[&str], list_key: &str, nested_key: &str) -> Option<String> {
    keys.iter()
        .find_map(|key| non_empty_str(value, key))
        .or_else(|| first_item(value, list_key).and_then(|item| non_empty_str(item, nested_key)))
        .map(str::to_string)
}

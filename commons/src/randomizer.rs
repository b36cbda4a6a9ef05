//! Инструменты для генерации случайных данных и последовательностей.

use rand::distr::uniform::SampleUniform;
use rand::prelude::*;

/// Генерировать случайное число из заданного числового диапазона
/// (включительно `max`).
///
/// ## Пример
///
/// ```
/// use commons::randomizer::random;
///
/// let num = random(10, 25);
/// println!("Lucky num: {}", num);
/// ```
///
/// ## Returns
///
/// Случайное число того же типа, что предоставленные для диапазона.
pub fn random<T>(min: T, max: T) -> T
where
    T: SampleUniform + PartialOrd,
{
    let mut rng = rand::rng();
    rng.random_range(min..=max)
}

/// Обёртка для функции [`random`]: позволяет генерировать случайное число
/// из диапазона между двумя числами, заданным в кортеже.
pub fn random_by_tuple<T>(t: (T, T)) -> T
where
    T: SampleUniform + PartialOrd,
{
    random(t.0, t.1)
}

/// Случайное число с плавающей точкой из полуинтервала `[0, 1)`.
///
/// Используется формулой ценообразования: верхняя граница случайного
/// колебания цены не достигается.
pub fn random_unit() -> f64 {
    let mut rng = rand::rng();
    rng.random::<f64>()
}

/// Сформировать случайную строку заданной длины из символов алфавита.
///
/// ## Пример
///
/// ```
/// use commons::randomizer::random_string;
///
/// let code = random_string("abc123", 8);
/// assert_eq!(code.len(), 8);
/// ```
///
/// ## Returns
///
/// Строка длины `len`. Если алфавит пуст, возвращается пустая строка.
pub fn random_string(alphabet: &str, len: usize) -> String {
    let chars: Vec<char> = alphabet.chars().collect();
    if chars.is_empty() {
        return String::new();
    }

    (0..len)
        .map(|_| chars[random(0, chars.len() - 1)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_with_integer_range() {
        let result = random(1, 10);

        // Проверяем границы
        assert!((1..=10).contains(&result));
    }

    #[test]
    fn test_random_with_float_range() {
        let result = random(0.0, 1.0);

        // Проверяем границы
        assert!((0.0..=1.0).contains(&result));
    }

    #[test]
    fn test_random_with_same_min_max() {
        let result = random(42, 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn test_random_by_tuple() {
        let range = (5, 15);
        let result = random_by_tuple(range);

        assert!((5..=15).contains(&result));
    }

    #[test]
    fn test_random_unit_in_half_open_range() {
        for _ in 0..100 {
            let u = random_unit();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_random_string_length_and_alphabet() {
        let alphabet = "xyz";
        let result = random_string(alphabet, 16);

        assert_eq!(result.len(), 16);
        assert!(result.chars().all(|c| alphabet.contains(c)));
    }

    #[test]
    fn test_random_string_empty_alphabet() {
        assert_eq!(random_string("", 8), "");
    }
}

//! Synthesized C runtime support
//!
//! The target language has no polymorphic containers, hash maps, string
//! helpers or JSON, so the generator emits them as C source. Everything
//! here is a block of string templates, organized in data-driven tables
//! so a helper family is emitted exactly once and only when the
//! pre-scan saw a use.
//!
//! The hash map core is unconditional; the dynamic array, the string
//! helpers, the JSON runtime and the per-method helpers are keyed off
//! the discovered method sets.

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::sync::LazyLock;

/// One named runtime helper: the method name that triggers it and the C
/// text that implements it.
pub(super) struct HelperDef {
    pub name: &'static str,
    pub code: &'static str,
}

/// Value-type tags and the helpers every generated program needs:
/// boxing for doubles, value comparison and tag-aware printing, and the
/// sprintf-backed cast helpers.
pub(super) const VALUE_CORE: &str = r#"typedef enum { AHOY_INT, AHOY_STRING, AHOY_FLOAT, AHOY_CHAR } ValueType;

static char* ahoy_strdup(const char* s) {
    size_t len = strlen(s) + 1;
    char* copy = malloc(len);
    memcpy(copy, s, len);
    return copy;
}

/* Doubles stored in the containers are heap-boxed to keep full width. */
static double* ahoy_box_double(double v) {
    double* box = malloc(sizeof(double));
    *box = v;
    return box;
}

static int ahoy_value_cmp(intptr_t a, ValueType ta, intptr_t b, ValueType tb) {
    if (ta == AHOY_FLOAT || tb == AHOY_FLOAT) {
        double da = (ta == AHOY_FLOAT) ? *(double*)a : (double)a;
        double db = (tb == AHOY_FLOAT) ? *(double*)b : (double)b;
        return (da > db) - (da < db);
    }
    if (ta == AHOY_STRING && tb == AHOY_STRING) {
        return strcmp((char*)a, (char*)b);
    }
    return (a > b) - (a < b);
}

static void ahoy_print_value(intptr_t value, ValueType type) {
    switch (type) {
        case AHOY_INT: printf("%ld", (long)value); break;
        case AHOY_FLOAT: printf("%g", *(double*)value); break;
        case AHOY_STRING: printf("%s", (char*)value); break;
        case AHOY_CHAR: printf("%c", (char)value); break;
    }
}

static char* ahoy_int_to_string(long v) {
    char* s = malloc(32);
    snprintf(s, 32, "%ld", v);
    return s;
}

static char* ahoy_float_to_string(double v) {
    char* s = malloc(40);
    snprintf(s, 40, "%g", v);
    return s;
}

static char* ahoy_char_to_string(char c) {
    char* s = malloc(2);
    s[0] = c;
    s[1] = '\0';
    return s;
}
"#;

/// The chained hash map. String keys, tagged values, fixed bucket
/// count, per-bucket singly-linked lists. Never resized.
pub(super) const HASHMAP_CORE: &str = r#"#define AHOY_MAP_BUCKETS 64

typedef struct HashMapEntry {
    char* key;
    intptr_t value;
    ValueType type;
    struct HashMapEntry* next;
} HashMapEntry;

typedef struct {
    HashMapEntry* buckets[AHOY_MAP_BUCKETS];
    int count;
} HashMap;

static unsigned long ahoy_map_hash(const char* key) {
    unsigned long h = 5381;
    while (*key) {
        h = ((h << 5) + h) + (unsigned char)*key++;
    }
    return h % AHOY_MAP_BUCKETS;
}

static HashMap ahoy_map_new(void) {
    HashMap map;
    memset(&map, 0, sizeof(map));
    return map;
}

static HashMapEntry* ahoy_map_find(HashMap* map, const char* key) {
    HashMapEntry* e;
    for (e = map->buckets[ahoy_map_hash(key)]; e; e = e->next) {
        if (strcmp(e->key, key) == 0) {
            return e;
        }
    }
    return NULL;
}

static void ahoy_map_put(HashMap* map, const char* key, intptr_t value, ValueType type) {
    HashMapEntry* e = ahoy_map_find(map, key);
    if (e) {
        e->value = value;
        e->type = type;
        return;
    }
    unsigned long idx = ahoy_map_hash(key);
    e = malloc(sizeof(HashMapEntry));
    e->key = ahoy_strdup(key);
    e->value = value;
    e->type = type;
    e->next = map->buckets[idx];
    map->buckets[idx] = e;
    map->count++;
}

static double ahoy_entry_number(HashMapEntry* e) {
    switch (e->type) {
        case AHOY_FLOAT: return *(double*)e->value;
        case AHOY_INT: return (double)e->value;
        case AHOY_CHAR: return (double)(char)e->value;
        case AHOY_STRING: return (double)(intptr_t)e->value;
    }
    return 0;
}

/* Accessor returns a double-width value; use sites recast on demand. */
static double ahoy_map_get(HashMap* map, const char* key) {
    HashMapEntry* e = ahoy_map_find(map, key);
    return e ? ahoy_entry_number(e) : 0;
}

static void ahoy_map_print_value(HashMap* map, const char* key) {
    HashMapEntry* e = ahoy_map_find(map, key);
    if (e) {
        ahoy_print_value(e->value, e->type);
    }
}
"#;

/// The typed dynamic array. Per-slot tags unless `is_typed` asserts a
/// single element type from an `array[T]` annotation.
pub(super) const ARRAY_CORE: &str = r#"typedef struct {
    intptr_t* data;
    ValueType* types;
    int length;
    int capacity;
    bool is_typed;
    ValueType element_type;
} AhoyArray;

static AhoyArray ahoy_array_new(void) {
    AhoyArray arr;
    arr.capacity = 8;
    arr.length = 0;
    arr.data = malloc(sizeof(intptr_t) * arr.capacity);
    arr.types = malloc(sizeof(ValueType) * arr.capacity);
    arr.is_typed = false;
    arr.element_type = AHOY_INT;
    return arr;
}

static void ahoy_array_push(AhoyArray* arr, intptr_t value, ValueType type) {
    if (arr->length == arr->capacity) {
        arr->capacity *= 2;
        arr->data = realloc(arr->data, sizeof(intptr_t) * arr->capacity);
        arr->types = realloc(arr->types, sizeof(ValueType) * arr->capacity);
    }
    arr->data[arr->length] = value;
    arr->types[arr->length] = type;
    arr->length++;
}
"#;

pub(super) static ARRAY_HELPERS: LazyLock<Vec<HelperDef>> = LazyLock::new(|| {
    vec![
        HelperDef {
            name: "pop",
            code: r#"static intptr_t ahoy_array_pop(AhoyArray* arr) {
    if (arr->length == 0) return 0;
    arr->length--;
    return arr->data[arr->length];
}
"#,
        },
        HelperDef {
            name: "shift",
            code: r#"static intptr_t ahoy_array_shift(AhoyArray* arr) {
    if (arr->length == 0) return 0;
    intptr_t value = arr->data[0];
    for (int i = 1; i < arr->length; i++) {
        arr->data[i - 1] = arr->data[i];
        arr->types[i - 1] = arr->types[i];
    }
    arr->length--;
    return value;
}
"#,
        },
        HelperDef {
            name: "insert",
            code: r#"static void ahoy_array_insert(AhoyArray* arr, int index, intptr_t value, ValueType type) {
    ahoy_array_push(arr, 0, AHOY_INT);
    for (int i = arr->length - 1; i > index; i--) {
        arr->data[i] = arr->data[i - 1];
        arr->types[i] = arr->types[i - 1];
    }
    arr->data[index] = value;
    arr->types[index] = type;
}
"#,
        },
        HelperDef {
            name: "remove",
            code: r#"static void ahoy_array_remove(AhoyArray* arr, int index) {
    if (index < 0 || index >= arr->length) return;
    for (int i = index + 1; i < arr->length; i++) {
        arr->data[i - 1] = arr->data[i];
        arr->types[i - 1] = arr->types[i];
    }
    arr->length--;
}
"#,
        },
        HelperDef {
            name: "index_of",
            code: r#"static int ahoy_array_index_of(AhoyArray* arr, intptr_t value, ValueType type) {
    for (int i = 0; i < arr->length; i++) {
        if (ahoy_value_cmp(arr->data[i], arr->types[i], value, type) == 0) {
            return i;
        }
    }
    return -1;
}
"#,
        },
        HelperDef {
            name: "has",
            code: r#"static bool ahoy_array_has(AhoyArray* arr, intptr_t value, ValueType type) {
    for (int i = 0; i < arr->length; i++) {
        if (ahoy_value_cmp(arr->data[i], arr->types[i], value, type) == 0) {
            return true;
        }
    }
    return false;
}
"#,
        },
        HelperDef {
            name: "sort",
            code: r#"static void ahoy_array_sort(AhoyArray* arr) {
    /* insertion sort keeps the value/type slots paired */
    for (int i = 1; i < arr->length; i++) {
        intptr_t v = arr->data[i];
        ValueType t = arr->types[i];
        int j = i - 1;
        while (j >= 0 && ahoy_value_cmp(arr->data[j], arr->types[j], v, t) > 0) {
            arr->data[j + 1] = arr->data[j];
            arr->types[j + 1] = arr->types[j];
            j--;
        }
        arr->data[j + 1] = v;
        arr->types[j + 1] = t;
    }
}
"#,
        },
        HelperDef {
            name: "reverse",
            code: r#"static void ahoy_array_reverse(AhoyArray* arr) {
    for (int i = 0, j = arr->length - 1; i < j; i++, j--) {
        intptr_t v = arr->data[i];
        ValueType t = arr->types[i];
        arr->data[i] = arr->data[j];
        arr->types[i] = arr->types[j];
        arr->data[j] = v;
        arr->types[j] = t;
    }
}
"#,
        },
        HelperDef {
            name: "sum",
            code: r#"static long ahoy_array_sum(AhoyArray* arr) {
    long total = 0;
    for (int i = 0; i < arr->length; i++) {
        total += (long)arr->data[i];
    }
    return total;
}

static double ahoy_array_sum_double(AhoyArray* arr) {
    double total = 0;
    for (int i = 0; i < arr->length; i++) {
        total += (arr->types[i] == AHOY_FLOAT) ? *(double*)arr->data[i] : (double)arr->data[i];
    }
    return total;
}
"#,
        },
        HelperDef {
            name: "min",
            code: r#"static intptr_t ahoy_array_min(AhoyArray* arr) {
    if (arr->length == 0) return 0;
    intptr_t best = arr->data[0];
    ValueType best_t = arr->types[0];
    for (int i = 1; i < arr->length; i++) {
        if (ahoy_value_cmp(arr->data[i], arr->types[i], best, best_t) < 0) {
            best = arr->data[i];
            best_t = arr->types[i];
        }
    }
    return best;
}
"#,
        },
        HelperDef {
            name: "max",
            code: r#"static intptr_t ahoy_array_max(AhoyArray* arr) {
    if (arr->length == 0) return 0;
    intptr_t best = arr->data[0];
    ValueType best_t = arr->types[0];
    for (int i = 1; i < arr->length; i++) {
        if (ahoy_value_cmp(arr->data[i], arr->types[i], best, best_t) > 0) {
            best = arr->data[i];
            best_t = arr->types[i];
        }
    }
    return best;
}
"#,
        },
        HelperDef {
            name: "avg",
            code: r#"static double ahoy_array_avg(AhoyArray* arr) {
    if (arr->length == 0) return 0;
    double total = 0;
    for (int i = 0; i < arr->length; i++) {
        total += (arr->types[i] == AHOY_FLOAT) ? *(double*)arr->data[i] : (double)arr->data[i];
    }
    return total / arr->length;
}
"#,
        },
        HelperDef {
            name: "join",
            code: r#"static char* ahoy_array_join(AhoyArray* arr, const char* sep) {
    size_t cap = 64;
    size_t len = 0;
    char* out = malloc(cap);
    out[0] = '\0';
    for (int i = 0; i < arr->length; i++) {
        char piece[64];
        const char* text = piece;
        ValueType t = arr->is_typed ? arr->element_type : arr->types[i];
        switch (t) {
            case AHOY_STRING: text = (char*)arr->data[i]; break;
            case AHOY_FLOAT: snprintf(piece, sizeof(piece), "%g", *(double*)arr->data[i]); break;
            case AHOY_CHAR: snprintf(piece, sizeof(piece), "%c", (char)arr->data[i]); break;
            default: snprintf(piece, sizeof(piece), "%ld", (long)arr->data[i]); break;
        }
        size_t need = len + strlen(text) + strlen(sep) + 1;
        if (need > cap) {
            while (need > cap) cap *= 2;
            out = realloc(out, cap);
        }
        if (i > 0) {
            strcat(out, sep);
            len += strlen(sep);
        }
        strcat(out, text);
        len += strlen(text);
    }
    return out;
}
"#,
        },
        HelperDef {
            name: "clear",
            code: r#"static void ahoy_array_clear(AhoyArray* arr) {
    arr->length = 0;
}
"#,
        },
    ]
});

pub(super) static DICT_HELPERS: LazyLock<Vec<HelperDef>> = LazyLock::new(|| {
    vec![
        HelperDef {
            name: "has",
            code: r#"static bool ahoy_map_has(HashMap* map, const char* key) {
    return ahoy_map_find(map, key) != NULL;
}
"#,
        },
        HelperDef {
            name: "has_all",
            code: r#"static bool ahoy_map_has_all(HashMap* map, AhoyArray* keys) {
    for (int i = 0; i < keys->length; i++) {
        if (!ahoy_map_find(map, (char*)keys->data[i])) {
            return false;
        }
    }
    return true;
}
"#,
        },
        HelperDef {
            name: "clear",
            code: r#"static void ahoy_map_clear(HashMap* map) {
    for (int b = 0; b < AHOY_MAP_BUCKETS; b++) {
        HashMapEntry* e = map->buckets[b];
        while (e) {
            HashMapEntry* next = e->next;
            free(e->key);
            free(e);
            e = next;
        }
        map->buckets[b] = NULL;
    }
    map->count = 0;
}
"#,
        },
        HelperDef {
            name: "keys",
            code: r#"static AhoyArray ahoy_map_keys(HashMap* map) {
    AhoyArray keys = ahoy_array_new();
    for (int b = 0; b < AHOY_MAP_BUCKETS; b++) {
        for (HashMapEntry* e = map->buckets[b]; e; e = e->next) {
            ahoy_array_push(&keys, (intptr_t)e->key, AHOY_STRING);
        }
    }
    return keys;
}
"#,
        },
        HelperDef {
            name: "values",
            code: r#"static AhoyArray ahoy_map_values(HashMap* map) {
    AhoyArray values = ahoy_array_new();
    for (int b = 0; b < AHOY_MAP_BUCKETS; b++) {
        for (HashMapEntry* e = map->buckets[b]; e; e = e->next) {
            ahoy_array_push(&values, e->value, e->type);
        }
    }
    return values;
}
"#,
        },
        HelperDef {
            name: "merge",
            code: r#"static void ahoy_map_merge(HashMap* map, HashMap* other) {
    for (int b = 0; b < AHOY_MAP_BUCKETS; b++) {
        for (HashMapEntry* e = other->buckets[b]; e; e = e->next) {
            ahoy_map_put(map, e->key, e->value, e->type);
        }
    }
}
"#,
        },
        HelperDef {
            name: "sort",
            code: r#"static void ahoy_map_sort(HashMap* map) {
    /* orders each bucket chain by key */
    for (int b = 0; b < AHOY_MAP_BUCKETS; b++) {
        for (HashMapEntry* e = map->buckets[b]; e; e = e->next) {
            for (HashMapEntry* f = e->next; f; f = f->next) {
                if (strcmp(e->key, f->key) > 0) {
                    char* key = e->key;
                    intptr_t value = e->value;
                    ValueType type = e->type;
                    e->key = f->key;
                    e->value = f->value;
                    e->type = f->type;
                    f->key = key;
                    f->value = value;
                    f->type = type;
                }
            }
        }
    }
}
"#,
        },
        HelperDef {
            name: "stable_sort",
            code: r#"static void ahoy_map_stable_sort(HashMap* map) {
    /* value-preserving variant of ahoy_map_sort: equal keys cannot
       occur in a map, so the ordering is the same */
    for (int b = 0; b < AHOY_MAP_BUCKETS; b++) {
        for (HashMapEntry* e = map->buckets[b]; e; e = e->next) {
            for (HashMapEntry* f = e->next; f; f = f->next) {
                if (strcmp(e->key, f->key) > 0) {
                    char* key = e->key;
                    intptr_t value = e->value;
                    ValueType type = e->type;
                    e->key = f->key;
                    e->value = f->value;
                    e->type = f->type;
                    f->key = key;
                    f->value = value;
                    f->type = type;
                }
            }
        }
    }
}
"#,
        },
    ]
});

pub(super) static STRING_HELPERS: LazyLock<Vec<HelperDef>> = LazyLock::new(|| {
    vec![
        HelperDef {
            name: "upper",
            code: r#"static char* ahoy_str_upper(const char* s) {
    char* out = ahoy_strdup(s);
    for (char* p = out; *p; p++) {
        if (*p >= 'a' && *p <= 'z') *p -= 32;
    }
    return out;
}
"#,
        },
        HelperDef {
            name: "lower",
            code: r#"static char* ahoy_str_lower(const char* s) {
    char* out = ahoy_strdup(s);
    for (char* p = out; *p; p++) {
        if (*p >= 'A' && *p <= 'Z') *p += 32;
    }
    return out;
}
"#,
        },
        HelperDef {
            name: "replace",
            code: r#"static char* ahoy_str_replace(const char* s, const char* from, const char* to) {
    size_t from_len = strlen(from);
    size_t to_len = strlen(to);
    if (from_len == 0) return ahoy_strdup(s);
    size_t cap = strlen(s) * (to_len > from_len ? to_len : 1) + 1;
    char* out = malloc(cap + 1);
    char* w = out;
    while (*s) {
        if (strncmp(s, from, from_len) == 0) {
            memcpy(w, to, to_len);
            w += to_len;
            s += from_len;
        } else {
            *w++ = *s++;
        }
    }
    *w = '\0';
    return out;
}
"#,
        },
        HelperDef {
            name: "contains",
            code: r#"static bool ahoy_str_contains(const char* s, const char* needle) {
    return strstr(s, needle) != NULL;
}
"#,
        },
        HelperDef {
            name: "match",
            code: r#"static bool ahoy_str_match(const char* s, const char* pattern) {
    return strstr(s, pattern) != NULL;
}
"#,
        },
        HelperDef {
            name: "strip",
            code: r#"static char* ahoy_str_strip(const char* s) {
    while (*s == ' ' || *s == '\t' || *s == '\n' || *s == '\r') s++;
    size_t len = strlen(s);
    while (len > 0 && (s[len - 1] == ' ' || s[len - 1] == '\t' || s[len - 1] == '\n' || s[len - 1] == '\r')) {
        len--;
    }
    char* out = malloc(len + 1);
    memcpy(out, s, len);
    out[len] = '\0';
    return out;
}
"#,
        },
        HelperDef {
            name: "count",
            code: r#"static int ahoy_str_count(const char* s, const char* needle) {
    if (!*needle) return 0;
    int n = 0;
    size_t step = strlen(needle);
    const char* p = s;
    while ((p = strstr(p, needle)) != NULL) {
        n++;
        p += step;
    }
    return n;
}
"#,
        },
        HelperDef {
            name: "split",
            code: r#"static AhoyArray ahoy_str_split(const char* s, const char* sep) {
    AhoyArray parts = ahoy_array_new();
    size_t sep_len = strlen(sep);
    if (sep_len == 0) {
        ahoy_array_push(&parts, (intptr_t)ahoy_strdup(s), AHOY_STRING);
        return parts;
    }
    const char* start = s;
    const char* hit;
    while ((hit = strstr(start, sep)) != NULL) {
        size_t len = hit - start;
        char* piece = malloc(len + 1);
        memcpy(piece, start, len);
        piece[len] = '\0';
        ahoy_array_push(&parts, (intptr_t)piece, AHOY_STRING);
        start = hit + sep_len;
    }
    ahoy_array_push(&parts, (intptr_t)ahoy_strdup(start), AHOY_STRING);
    return parts;
}
"#,
        },
        HelperDef {
            name: "reverse",
            code: r#"static char* ahoy_str_reverse(const char* s) {
    size_t len = strlen(s);
    char* out = malloc(len + 1);
    for (size_t i = 0; i < len; i++) {
        out[i] = s[len - 1 - i];
    }
    out[len] = '\0';
    return out;
}
"#,
        },
        HelperDef {
            name: "lpad",
            code: r#"static char* ahoy_str_lpad(const char* s, int width, const char* fill) {
    int len = (int)strlen(s);
    if (len >= width || !*fill) return ahoy_strdup(s);
    char* out = malloc((size_t)width + 1);
    int pad = width - len;
    for (int i = 0; i < pad; i++) {
        out[i] = fill[i % strlen(fill)];
    }
    memcpy(out + pad, s, (size_t)len + 1);
    return out;
}
"#,
        },
        HelperDef {
            name: "rpad",
            code: r#"static char* ahoy_str_rpad(const char* s, int width, const char* fill) {
    int len = (int)strlen(s);
    if (len >= width || !*fill) return ahoy_strdup(s);
    char* out = malloc((size_t)width + 1);
    memcpy(out, s, (size_t)len);
    for (int i = len; i < width; i++) {
        out[i] = fill[(i - len) % strlen(fill)];
    }
    out[width] = '\0';
    return out;
}
"#,
        },
        HelperDef {
            name: "pad",
            code: r#"static char* ahoy_str_pad(const char* s, int width, const char* fill) {
    int len = (int)strlen(s);
    if (len >= width || !*fill) return ahoy_strdup(s);
    int total = width - len;
    int left = total / 2;
    char* out = malloc((size_t)width + 1);
    for (int i = 0; i < left; i++) {
        out[i] = fill[i % strlen(fill)];
    }
    memcpy(out + left, s, (size_t)len);
    for (int i = left + len; i < width; i++) {
        out[i] = fill[(i - left - len) % strlen(fill)];
    }
    out[width] = '\0';
    return out;
}
"#,
        },
        HelperDef {
            name: "snake_case",
            code: r#"static char* ahoy_str_snake_case(const char* s) {
    size_t len = strlen(s);
    char* out = malloc(len * 2 + 1);
    char* w = out;
    for (size_t i = 0; i < len; i++) {
        char c = s[i];
        if (c >= 'A' && c <= 'Z') {
            if (i > 0 && s[i - 1] != ' ' && s[i - 1] != '_') *w++ = '_';
            *w++ = c + 32;
        } else if (c == ' ' || c == '-') {
            *w++ = '_';
        } else {
            *w++ = c;
        }
    }
    *w = '\0';
    return out;
}
"#,
        },
        HelperDef {
            name: "camel_case",
            code: r#"static char* ahoy_str_camel_case(const char* s) {
    char* out = malloc(strlen(s) + 1);
    char* w = out;
    bool up = false;
    for (const char* p = s; *p; p++) {
        if (*p == '_' || *p == ' ' || *p == '-') {
            up = true;
        } else if (up) {
            *w++ = (*p >= 'a' && *p <= 'z') ? *p - 32 : *p;
            up = false;
        } else {
            *w++ = *p;
        }
    }
    *w = '\0';
    return out;
}
"#,
        },
        HelperDef {
            name: "pascal_case",
            code: r#"static char* ahoy_str_pascal_case(const char* s) {
    char* out = malloc(strlen(s) + 1);
    char* w = out;
    bool up = true;
    for (const char* p = s; *p; p++) {
        if (*p == '_' || *p == ' ' || *p == '-') {
            up = true;
        } else if (up) {
            *w++ = (*p >= 'a' && *p <= 'z') ? *p - 32 : *p;
            up = false;
        } else {
            *w++ = *p;
        }
    }
    *w = '\0';
    return out;
}
"#,
        },
        HelperDef {
            name: "kebab_case",
            code: r#"static char* ahoy_str_kebab_case(const char* s) {
    size_t len = strlen(s);
    char* out = malloc(len * 2 + 1);
    char* w = out;
    for (size_t i = 0; i < len; i++) {
        char c = s[i];
        if (c >= 'A' && c <= 'Z') {
            if (i > 0 && s[i - 1] != ' ' && s[i - 1] != '-') *w++ = '-';
            *w++ = c + 32;
        } else if (c == ' ' || c == '_') {
            *w++ = '-';
        } else {
            *w++ = c;
        }
    }
    *w = '\0';
    return out;
}
"#,
        },
        HelperDef {
            name: "title_case",
            code: r#"static char* ahoy_str_title_case(const char* s) {
    char* out = ahoy_strdup(s);
    bool up = true;
    for (char* p = out; *p; p++) {
        if (*p == ' ' || *p == '_' || *p == '-') {
            up = true;
        } else if (up) {
            if (*p >= 'a' && *p <= 'z') *p -= 32;
            up = false;
        } else if (*p >= 'A' && *p <= 'Z') {
            *p += 32;
        }
    }
    return out;
}
"#,
        },
        HelperDef {
            name: "get_file",
            code: r#"static char* ahoy_str_get_file(const char* path) {
    FILE* f = fopen(path, "rb");
    if (!f) return ahoy_strdup("");
    fseek(f, 0, SEEK_END);
    long size = ftell(f);
    fseek(f, 0, SEEK_SET);
    char* out = malloc((size_t)size + 1);
    size_t got = fread(out, 1, (size_t)size, f);
    out[got] = '\0';
    fclose(f);
    return out;
}
"#,
        },
    ]
});

/// Tag-aware container printers.
pub(super) const PRINT_ARRAY_HELPER: &str = r#"static void ahoy_print_array(AhoyArray* arr) {
    printf("[");
    for (int i = 0; i < arr->length; i++) {
        if (i > 0) printf(", ");
        ValueType t = arr->is_typed ? arr->element_type : arr->types[i];
        ahoy_print_value(arr->data[i], t);
    }
    printf("]");
}
"#;

pub(super) const PRINT_DICT_HELPER: &str = r#"static void ahoy_print_dict(HashMap* map) {
    printf("{");
    bool first = true;
    for (int b = 0; b < AHOY_MAP_BUCKETS; b++) {
        for (HashMapEntry* e = map->buckets[b]; e; e = e->next) {
            if (!first) printf(", ");
            first = false;
            printf("%s: ", e->key);
            ahoy_print_value(e->value, e->type);
        }
    }
    printf("}");
}
"#;

pub(super) const COLOR_CORE: &str = r#"typedef struct {
    int r;
    int g;
    int b;
    int a;
} AhoyColor;

static char* ahoy_color_to_string(AhoyColor c) {
    char* s = malloc(48);
    snprintf(s, 48, "color(%d, %d, %d, %d)", c.r, c.g, c.b, c.a);
    return s;
}
"#;

pub(super) const VECTOR2_CORE: &str = r#"typedef struct {
    double x;
    double y;
} AhoyVector2;

static char* ahoy_vector2_to_string(AhoyVector2 v) {
    char* s = malloc(48);
    snprintf(s, 48, "vector2(%g, %g)", v.x, v.y);
    return s;
}
"#;

/// Recursive-descent JSON parser over a tagged union, plus accessors,
/// a stringifier, and the `read_json`/`write_json` entry points.
pub(super) const JSON_RUNTIME: &str = r#"typedef enum {
    AHOY_JSON_OBJECT,
    AHOY_JSON_ARRAY,
    AHOY_JSON_STRING,
    AHOY_JSON_NUMBER,
    AHOY_JSON_BOOL,
    AHOY_JSON_NULL
} AhoyJSONType;

typedef struct AhoyJSON {
    AhoyJSONType type;
    double number;
    char* string;
    bool boolean;
    struct AhoyJSON** items;
    char** keys;
    int count;
    int capacity;
} AhoyJSON;

static AhoyJSON* ahoy_json_new(AhoyJSONType type) {
    AhoyJSON* j = calloc(1, sizeof(AhoyJSON));
    j->type = type;
    return j;
}

static void ahoy_json_append(AhoyJSON* j, char* key, AhoyJSON* child) {
    if (j->count == j->capacity) {
        j->capacity = j->capacity ? j->capacity * 2 : 4;
        j->items = realloc(j->items, sizeof(AhoyJSON*) * j->capacity);
        j->keys = realloc(j->keys, sizeof(char*) * j->capacity);
    }
    j->items[j->count] = child;
    j->keys[j->count] = key;
    j->count++;
}

static void ahoy_json_skip_ws(const char** p) {
    while (**p == ' ' || **p == '\t' || **p == '\n' || **p == '\r') (*p)++;
}

static AhoyJSON* ahoy_json_parse_value(const char** p);

static char* ahoy_json_parse_raw_string(const char** p) {
    (*p)++; /* opening quote */
    size_t cap = 16;
    size_t len = 0;
    char* out = malloc(cap);
    while (**p && **p != '"') {
        char c = **p;
        if (c == '\\') {
            (*p)++;
            switch (**p) {
                case 'n': c = '\n'; break;
                case 't': c = '\t'; break;
                case 'r': c = '\r'; break;
                case '"': c = '"'; break;
                case '\\': c = '\\'; break;
                default: c = **p; break;
            }
        }
        if (len + 1 >= cap) {
            cap *= 2;
            out = realloc(out, cap);
        }
        out[len++] = c;
        (*p)++;
    }
    if (**p == '"') (*p)++;
    out[len] = '\0';
    return out;
}

static AhoyJSON* ahoy_json_parse_object(const char** p) {
    AhoyJSON* obj = ahoy_json_new(AHOY_JSON_OBJECT);
    (*p)++; /* '{' */
    ahoy_json_skip_ws(p);
    if (**p == '}') {
        (*p)++;
        return obj;
    }
    while (**p) {
        ahoy_json_skip_ws(p);
        if (**p != '"') break;
        char* key = ahoy_json_parse_raw_string(p);
        ahoy_json_skip_ws(p);
        if (**p == ':') (*p)++;
        AhoyJSON* value = ahoy_json_parse_value(p);
        ahoy_json_append(obj, key, value);
        ahoy_json_skip_ws(p);
        if (**p == ',') {
            (*p)++;
            continue;
        }
        break;
    }
    if (**p == '}') (*p)++;
    return obj;
}

static AhoyJSON* ahoy_json_parse_array(const char** p) {
    AhoyJSON* arr = ahoy_json_new(AHOY_JSON_ARRAY);
    (*p)++; /* '[' */
    ahoy_json_skip_ws(p);
    if (**p == ']') {
        (*p)++;
        return arr;
    }
    while (**p) {
        AhoyJSON* value = ahoy_json_parse_value(p);
        ahoy_json_append(arr, NULL, value);
        ahoy_json_skip_ws(p);
        if (**p == ',') {
            (*p)++;
            continue;
        }
        break;
    }
    if (**p == ']') (*p)++;
    return arr;
}

static AhoyJSON* ahoy_json_parse_value(const char** p) {
    ahoy_json_skip_ws(p);
    switch (**p) {
        case '{': return ahoy_json_parse_object(p);
        case '[': return ahoy_json_parse_array(p);
        case '"': {
            AhoyJSON* j = ahoy_json_new(AHOY_JSON_STRING);
            j->string = ahoy_json_parse_raw_string(p);
            return j;
        }
        case 't': {
            AhoyJSON* j = ahoy_json_new(AHOY_JSON_BOOL);
            j->boolean = true;
            *p += 4;
            return j;
        }
        case 'f': {
            AhoyJSON* j = ahoy_json_new(AHOY_JSON_BOOL);
            j->boolean = false;
            *p += 5;
            return j;
        }
        case 'n': {
            *p += 4;
            return ahoy_json_new(AHOY_JSON_NULL);
        }
        default: {
            AhoyJSON* j = ahoy_json_new(AHOY_JSON_NUMBER);
            char* end;
            j->number = strtod(*p, &end);
            *p = end;
            return j;
        }
    }
}

static AhoyJSON* ahoy_json_get(AhoyJSON* j, const char* key) {
    if (!j || j->type != AHOY_JSON_OBJECT) return NULL;
    for (int i = 0; i < j->count; i++) {
        if (strcmp(j->keys[i], key) == 0) return j->items[i];
    }
    return NULL;
}

static AhoyJSON* ahoy_json_index(AhoyJSON* j, int i) {
    if (!j || i < 0 || i >= j->count) return NULL;
    return j->items[i];
}

static double ahoy_json_number(AhoyJSON* j) {
    return j ? j->number : 0;
}

static char* ahoy_json_string(AhoyJSON* j) {
    return (j && j->string) ? j->string : "";
}

static void ahoy_json_stringify_into(AhoyJSON* j, char** out, size_t* len, size_t* cap) {
    char buf[64];
    const char* text = buf;
    if (!j) {
        text = "null";
    } else {
        switch (j->type) {
            case AHOY_JSON_NULL: text = "null"; break;
            case AHOY_JSON_BOOL: text = j->boolean ? "true" : "false"; break;
            case AHOY_JSON_NUMBER: snprintf(buf, sizeof(buf), "%g", j->number); break;
            case AHOY_JSON_STRING: text = NULL; break;
            default: text = NULL; break;
        }
    }
    if (text) {
        size_t need = *len + strlen(text) + 1;
        while (need > *cap) {
            *cap *= 2;
            *out = realloc(*out, *cap);
        }
        strcat(*out, text);
        *len += strlen(text);
        return;
    }
    if (j->type == AHOY_JSON_STRING) {
        size_t need = *len + strlen(j->string) + 3;
        while (need > *cap) {
            *cap *= 2;
            *out = realloc(*out, *cap);
        }
        strcat(*out, "\"");
        strcat(*out, j->string);
        strcat(*out, "\"");
        *len += strlen(j->string) + 2;
        return;
    }
    const char* open = (j->type == AHOY_JSON_OBJECT) ? "{" : "[";
    const char* close = (j->type == AHOY_JSON_OBJECT) ? "}" : "]";
    size_t need = *len + 2;
    while (need > *cap) {
        *cap *= 2;
        *out = realloc(*out, *cap);
    }
    strcat(*out, open);
    *len += 1;
    for (int i = 0; i < j->count; i++) {
        if (i > 0) {
            while (*len + 2 > *cap) {
                *cap *= 2;
                *out = realloc(*out, *cap);
            }
            strcat(*out, ",");
            *len += 1;
        }
        if (j->type == AHOY_JSON_OBJECT) {
            size_t key_need = *len + strlen(j->keys[i]) + 4;
            while (key_need > *cap) {
                *cap *= 2;
                *out = realloc(*out, *cap);
            }
            strcat(*out, "\"");
            strcat(*out, j->keys[i]);
            strcat(*out, "\":");
            *len += strlen(j->keys[i]) + 3;
        }
        ahoy_json_stringify_into(j->items[i], out, len, cap);
    }
    while (*len + 2 > *cap) {
        *cap *= 2;
        *out = realloc(*out, *cap);
    }
    strcat(*out, close);
    *len += 1;
}

static char* ahoy_json_stringify(AhoyJSON* j) {
    size_t cap = 64;
    size_t len = 0;
    char* out = malloc(cap);
    out[0] = '\0';
    ahoy_json_stringify_into(j, &out, &len, &cap);
    return out;
}

typedef struct {
    AhoyJSON* ret0;
    char* ret1;
} read_json_return;

static read_json_return ahoy_read_json(const char* path) {
    read_json_return result;
    result.ret0 = NULL;
    result.ret1 = NULL;
    FILE* f = fopen(path, "rb");
    if (!f) {
        result.ret1 = ahoy_strdup("cannot open file");
        return result;
    }
    fseek(f, 0, SEEK_END);
    long size = ftell(f);
    fseek(f, 0, SEEK_SET);
    char* text = malloc((size_t)size + 1);
    size_t got = fread(text, 1, (size_t)size, f);
    text[got] = '\0';
    fclose(f);
    const char* cursor = text;
    result.ret0 = ahoy_json_parse_value(&cursor);
    free(text);
    return result;
}

static char* ahoy_write_json(const char* path, AhoyJSON* j) {
    FILE* f = fopen(path, "wb");
    if (!f) {
        return ahoy_strdup("cannot open file");
    }
    char* text = ahoy_json_stringify(j);
    fputs(text, f);
    fclose(f);
    free(text);
    return NULL;
}
"#;

/// Emit the helper functions for one family, in table order, filtered
/// to the method names the pre-scan observed.
pub(super) fn emit_helpers(
    out: &mut String,
    table: &[HelperDef],
    wanted: &BTreeSet<String>,
) -> fmt::Result {
    for helper in table {
        if wanted.contains(helper.name) {
            writeln!(out, "{}", helper.code)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_templates_reference_only_core_symbols() {
        assert!(VALUE_CORE.contains("ahoy_box_double"));
        assert!(HASHMAP_CORE.contains("ahoy_map_put"));
        assert!(HASHMAP_CORE.contains("AHOY_MAP_BUCKETS"));
        assert!(ARRAY_CORE.contains("is_typed"));
    }

    #[test]
    fn test_helper_tables_cover_routed_methods() {
        let array_names: Vec<&str> = ARRAY_HELPERS.iter().map(|h| h.name).collect();
        for name in ["pop", "sort", "sum", "join", "has", "index_of"] {
            assert!(array_names.contains(&name), "missing array helper {}", name);
        }
        let dict_names: Vec<&str> = DICT_HELPERS.iter().map(|h| h.name).collect();
        for name in ["has", "has_all", "keys", "values", "merge", "clear"] {
            assert!(dict_names.contains(&name), "missing dict helper {}", name);
        }
        let string_names: Vec<&str> = STRING_HELPERS.iter().map(|h| h.name).collect();
        for name in ["upper", "lower", "replace", "split", "lpad", "get_file"] {
            assert!(string_names.contains(&name), "missing string helper {}", name);
        }
    }

    #[test]
    fn test_emit_helpers_filters_by_use() {
        let mut wanted = BTreeSet::new();
        wanted.insert("pop".to_string());
        let mut out = String::new();
        emit_helpers(&mut out, &ARRAY_HELPERS, &wanted).unwrap();
        assert!(out.contains("ahoy_array_pop"));
        assert!(!out.contains("ahoy_array_sort"));
    }

    #[test]
    fn test_json_runtime_has_multi_return_struct() {
        assert!(JSON_RUNTIME.contains("read_json_return"));
        assert!(JSON_RUNTIME.contains("ahoy_json_stringify"));
    }
}

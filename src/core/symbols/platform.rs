//! Declaration-only model of the Java platform types steps commonly touch.
//!
//! Parsed by the same front end as project sources and registered as
//! non-local, so calls such as `System.out.println(..)` resolve to real
//! signatures without a JDK on disk.

/// Pseudo file name and source of each platform package
pub const PLATFORM_SOURCES: &[(&str, &str)] = &[
    ("<platform>/java/lang.java", JAVA_LANG),
    ("<platform>/java/io.java", JAVA_IO),
    ("<platform>/java/util.java", JAVA_UTIL),
    ("<platform>/java/util/stream.java", JAVA_UTIL_STREAM),
    ("<platform>/java/util/function.java", JAVA_UTIL_FUNCTION),
];

const JAVA_LANG: &str = r#"
package java.lang;

public class Object {
    public native boolean equals(Object other);
    public native int hashCode();
    public native String toString();
    public final native Class<?> getClass();
}

public final class Class<T> {
    public native String getName();
    public native String getSimpleName();
}

public final class String implements CharSequence, Comparable<String> {
    public native int length();
    public native boolean isEmpty();
    public native char charAt(int index);
    public native boolean equals(Object other);
    public native boolean equalsIgnoreCase(String other);
    public native boolean contains(CharSequence sequence);
    public native boolean startsWith(String prefix);
    public native boolean endsWith(String suffix);
    public native String substring(int begin);
    public native String substring(int begin, int end);
    public native String trim();
    public native String toLowerCase();
    public native String toUpperCase();
    public native String replace(CharSequence target, CharSequence replacement);
    public native String[] split(String regex);
    public native int compareTo(String other);
    public static native String format(String format, Object... args);
    public static native String valueOf(Object value);
    public static native String valueOf(int value);
    public static native String join(CharSequence delimiter, CharSequence... elements);
}

public interface CharSequence {
    int length();
    char charAt(int index);
}

public interface Comparable<T> {
    int compareTo(T other);
}

public interface Iterable<T> {
    java.util.Iterator<T> iterator();
    void forEach(java.util.function.Consumer<? super T> action);
}

public interface Runnable {
    void run();
}

public interface AutoCloseable {
    void close();
}

public final class System {
    public static final java.io.PrintStream out;
    public static final java.io.PrintStream err;
    public static native long currentTimeMillis();
    public static native long nanoTime();
    public static native String getProperty(String key);
    public static native String getenv(String name);
}

public abstract class Number {
    public abstract int intValue();
    public abstract long longValue();
    public abstract double doubleValue();
}

public final class Integer extends Number implements Comparable<Integer> {
    public static native Integer valueOf(int value);
    public static native int parseInt(String value);
    public native int intValue();
    public native int compareTo(Integer other);
}

public final class Long extends Number implements Comparable<Long> {
    public static native Long valueOf(long value);
    public static native long parseLong(String value);
    public native long longValue();
}

public final class Double extends Number implements Comparable<Double> {
    public static native Double valueOf(double value);
    public static native double parseDouble(String value);
    public native double doubleValue();
}

public final class Float extends Number {
    public static native Float valueOf(float value);
}

public final class Short extends Number {
    public static native Short valueOf(short value);
}

public final class Byte extends Number {
    public static native Byte valueOf(byte value);
}

public final class Boolean {
    public static native Boolean valueOf(boolean value);
    public static native boolean parseBoolean(String value);
    public native boolean booleanValue();
}

public final class Character {
    public static native Character valueOf(char value);
    public static native boolean isDigit(char value);
}

public final class StringBuilder implements CharSequence {
    public native StringBuilder append(Object value);
    public native StringBuilder append(String value);
    public native StringBuilder append(int value);
    public native int length();
    public native String toString();
}

public final class Math {
    public static native int max(int a, int b);
    public static native int min(int a, int b);
    public static native int abs(int value);
    public static native double random();
}

public class Throwable {
    public native String getMessage();
    public native void printStackTrace();
}

public class Exception extends Throwable {
}

public class RuntimeException extends Exception {
}

public class IllegalArgumentException extends RuntimeException {
}

public class IllegalStateException extends RuntimeException {
}
"#;

const JAVA_IO: &str = r#"
package java.io;

public class PrintStream {
    public native void print(String value);
    public native void print(Object value);
    public native void print(int value);
    public native void println();
    public native void println(boolean value);
    public native void println(char value);
    public native void println(int value);
    public native void println(long value);
    public native void println(double value);
    public native void println(String value);
    public native void println(Object value);
    public native PrintStream printf(String format, Object... args);
    public native PrintStream format(String format, Object... args);
    public native void flush();
}

public interface Serializable {
}
"#;

const JAVA_UTIL: &str = r#"
package java.util;

import java.util.function.Consumer;
import java.util.function.Function;
import java.util.function.Predicate;
import java.util.function.Supplier;
import java.util.stream.Stream;

public interface Iterator<E> {
    boolean hasNext();
    E next();
}

public interface Collection<E> extends Iterable<E> {
    int size();
    boolean isEmpty();
    boolean contains(Object element);
    boolean add(E element);
    boolean remove(Object element);
    boolean addAll(Collection<? extends E> elements);
    void clear();
    Stream<E> stream();
}

public interface List<E> extends Collection<E> {
    E get(int index);
    E set(int index, E element);
    void add(int index, E element);
    E remove(int index);
    int indexOf(Object element);
    List<E> subList(int from, int to);
    static <E> List<E> of(E... elements);
    static <E> List<E> copyOf(Collection<? extends E> elements);
}

public interface Set<E> extends Collection<E> {
    static <E> Set<E> of(E... elements);
}

public class ArrayList<E> implements List<E> {
    public native E get(int index);
    public native int size();
    public native boolean add(E element);
}

public class LinkedList<E> implements List<E> {
    public native E get(int index);
    public native int size();
    public native boolean add(E element);
}

public class HashSet<E> implements Set<E> {
    public native int size();
    public native boolean add(E element);
}

public interface Map<K, V> {
    int size();
    boolean isEmpty();
    V get(Object key);
    V put(K key, V value);
    V remove(Object key);
    boolean containsKey(Object key);
    V getOrDefault(Object key, V fallback);
    Set<K> keySet();
    Collection<V> values();
    static <K, V> Map<K, V> of();
}

public class HashMap<K, V> implements Map<K, V> {
    public native V get(Object key);
    public native V put(K key, V value);
}

public final class Optional<T> {
    public static native <T> Optional<T> of(T value);
    public static native <T> Optional<T> ofNullable(T value);
    public static native <T> Optional<T> empty();
    public native boolean isPresent();
    public native T get();
    public native T orElse(T other);
    public native <U> Optional<U> map(Function<? super T, ? extends U> mapper);
    public native void ifPresent(Consumer<? super T> action);
}

public final class Arrays {
    public static native <T> List<T> asList(T... elements);
    public static native String toString(Object[] values);
}

public final class Collections {
    public static native <T> List<T> emptyList();
    public static native <T> List<T> singletonList(T element);
    public static native <T> List<T> unmodifiableList(List<? extends T> list);
}

public final class Objects {
    public static native boolean equals(Object a, Object b);
    public static native int hash(Object... values);
    public static native <T> T requireNonNull(T value);
    public static native <T> T requireNonNull(T value, String message);
    public static native boolean isNull(Object value);
}
"#;

const JAVA_UTIL_STREAM: &str = r#"
package java.util.stream;

import java.util.List;
import java.util.Optional;
import java.util.function.Function;
import java.util.function.Predicate;
import java.util.function.Consumer;

public interface Stream<T> {
    Stream<T> filter(Predicate<? super T> predicate);
    <R> Stream<R> map(Function<? super T, ? extends R> mapper);
    IntStream mapToInt(Object mapper);
    void forEach(Consumer<? super T> action);
    <R, A> R collect(Collector<? super T, A, R> collector);
    List<T> toList();
    Optional<T> findFirst();
    long count();
    boolean anyMatch(Predicate<? super T> predicate);
    static <T> Stream<T> of(T... values);
}

public interface IntStream {
    int sum();
    IntStream filter(Object predicate);
    static IntStream range(int start, int end);
}

public interface Collector<T, A, R> {
}

public final class Collectors {
    public static native <T> Collector<T, ?, List<T>> toList();
    public static native Collector<CharSequence, ?, String> joining(CharSequence delimiter);
}
"#;

const JAVA_UTIL_FUNCTION: &str = r#"
package java.util.function;

public interface Function<T, R> {
    R apply(T value);
}

public interface Supplier<T> {
    T get();
}

public interface Consumer<T> {
    void accept(T value);
}

public interface Predicate<T> {
    boolean test(T value);
}

public interface BiFunction<T, U, R> {
    R apply(T first, U second);
}
"#;
